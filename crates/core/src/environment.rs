//! Host environment access: injected providers, pairing client, timer.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::pairing::PairingClient;
use crate::provider::ProviderRef;

/// Provider objects injected into the page, read fresh on every inspection.
///
/// `collection` models the `providers` array some multi-wallet setups attach
/// to the top-level provider; it never exists without a top-level provider.
#[derive(Clone, Default)]
pub struct InjectedProviders {
	primary: Option<ProviderRef>,
	collection: Option<Vec<ProviderRef>>,
}

impl InjectedProviders {
	/// No injected provider at all.
	pub fn none() -> Self {
		Self::default()
	}

	/// A single top-level provider without a `providers` collection.
	pub fn single(primary: ProviderRef) -> Self {
		Self {
			primary: Some(primary),
			collection: None,
		}
	}

	/// A top-level provider exposing a `providers` collection.
	pub fn with_collection(primary: ProviderRef, collection: Vec<ProviderRef>) -> Self {
		Self {
			primary: Some(primary),
			collection: Some(collection),
		}
	}

	pub fn primary(&self) -> Option<&ProviderRef> {
		self.primary.as_ref()
	}

	pub fn collection(&self) -> Option<&[ProviderRef]> {
		self.collection.as_deref()
	}

	/// The provider to use when no identity matches: the top-level one.
	///
	/// Backs both the locator's last resort and the synthesized
	/// "Browser Wallet" catalog entry.
	pub fn fallback(&self) -> Option<&ProviderRef> {
		self.primary.as_ref()
	}

	pub fn is_empty(&self) -> bool {
		self.primary.is_none()
	}
}

/// Source of injected providers (the page's `window.ethereum`).
pub trait InjectedHost {
	/// Inspects the host as it is right now.
	fn injected(&self) -> InjectedProviders;
}

/// Suspends the current task; the browser build uses `setTimeout`.
#[async_trait(?Send)]
pub trait Timer {
	async fn sleep(&self, duration: Duration);
}

/// [`Timer`] backed by the tokio time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

#[async_trait(?Send)]
impl Timer for TokioTimer {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// Everything detection and sessions need from the host.
#[derive(Clone)]
pub struct WalletEnvironment {
	host: Rc<dyn InjectedHost>,
	pairing: Option<Rc<dyn PairingClient>>,
	timer: Rc<dyn Timer>,
}

impl WalletEnvironment {
	/// Creates an environment without remote pairing, using [`TokioTimer`].
	pub fn new(host: Rc<dyn InjectedHost>) -> Self {
		Self {
			host,
			pairing: None,
			timer: Rc::new(TokioTimer),
		}
	}

	/// Sets the remote pairing client.
	pub fn with_pairing(mut self, pairing: Rc<dyn PairingClient>) -> Self {
		self.pairing = Some(pairing);
		self
	}

	pub fn with_timer(mut self, timer: Rc<dyn Timer>) -> Self {
		self.timer = timer;
		self
	}

	/// Reads the injected providers from the host.
	pub fn injected(&self) -> InjectedProviders {
		self.host.injected()
	}

	pub fn pairing(&self) -> Option<&Rc<dyn PairingClient>> {
		self.pairing.as_ref()
	}

	pub fn timer(&self) -> &dyn Timer {
		self.timer.as_ref()
	}
}
