//! Events emitted by providers through `provider.on(name, listener)`.

use serde_json::Value;

use crate::chain::{parse_accounts, parse_chain_id};
use crate::error::ProviderRpcError;

/// Event names every provider is subscribed to.
pub const EVENT_NAMES: [&str; 4] = ["connect", "disconnect", "accountsChanged", "chainChanged"];

/// A provider-emitted notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
	/// The provider can service requests; carries the chain it connected to.
	Connect { chain_id: Option<u64> },
	/// The provider lost its connection (or the remote peer ended the session).
	Disconnect { error: Option<ProviderRpcError> },
	/// The exposed account list changed. Empty means the page lost access.
	AccountsChanged(Vec<String>),
	ChainChanged(u64),
}

impl ProviderEvent {
	/// Returns the EIP-1193 event name.
	pub fn name(&self) -> &'static str {
		match self {
			ProviderEvent::Connect { .. } => "connect",
			ProviderEvent::Disconnect { .. } => "disconnect",
			ProviderEvent::AccountsChanged(_) => "accountsChanged",
			ProviderEvent::ChainChanged(_) => "chainChanged",
		}
	}

	/// Parses a raw listener payload for event `name`.
	///
	/// Returns `None` for unknown event names and for `chainChanged` payloads
	/// that do not carry a readable chain id.
	pub fn from_raw(name: &str, payload: &Value) -> Option<Self> {
		match name {
			"connect" => Some(ProviderEvent::Connect {
				chain_id: payload.get("chainId").and_then(parse_chain_id),
			}),
			"disconnect" => Some(ProviderEvent::Disconnect {
				error: payload
					.is_object()
					.then(|| serde_json::from_value::<ProviderRpcError>(payload.clone()).ok())
					.flatten(),
			}),
			"accountsChanged" => Some(ProviderEvent::AccountsChanged(parse_accounts(payload))),
			"chainChanged" => parse_chain_id(payload).map(ProviderEvent::ChainChanged),
			_ => None,
		}
	}
}
