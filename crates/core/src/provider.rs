//! The EIP-1193 provider abstraction.

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use wallet_protocol::{CapabilityFlags, ProviderRpcError, RequestArguments, parse_accounts};

use crate::handlers::{EventListener, Subscription};

/// Shared handle to a provider object.
///
/// Providers belong to a single logical thread (browser objects are not
/// `Send`), so handles are reference counted with [`Rc`].
pub type ProviderRef = Rc<dyn Eip1193Provider>;

/// A wallet provider: request/response plus event subscription.
///
/// Injected extensions and remote pairing sessions both implement this; the
/// optional methods have defaults matching a plain injected provider.
#[async_trait(?Send)]
pub trait Eip1193Provider {
	/// Identity claims the provider makes about itself.
	fn flags(&self) -> CapabilityFlags;

	/// Issues `request({ method, params })`.
	async fn request(&self, args: RequestArguments) -> Result<Value, ProviderRpcError>;

	/// Subscribes to `connect`, `disconnect`, `accountsChanged` and `chainChanged`.
	fn subscribe(&self, listener: EventListener) -> Subscription;

	/// Whether a remote session is already live.
	fn is_connected(&self) -> bool {
		false
	}

	/// Starts (or resumes) authorization and returns the exposed accounts.
	///
	/// For remote pairing this triggers out-of-band peer approval.
	async fn enable(&self) -> Result<Vec<String>, ProviderRpcError> {
		let accounts = self.request(RequestArguments::request_accounts()).await?;
		Ok(parse_accounts(&accounts))
	}

	/// Tears down the provider-side session, when the provider has one.
	async fn disconnect(&self) -> Result<(), ProviderRpcError> {
		Ok(())
	}
}
