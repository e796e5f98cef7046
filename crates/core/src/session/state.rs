use std::fmt;

use serde::Serialize;

use crate::catalog::WalletDescriptor;
use crate::provider::ProviderRef;

/// Coarse lifecycle position derived from [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
	Disconnected,
	Connecting,
	Connected,
}

/// The one connection session.
///
/// `connected` implies `provider` is set, and a disconnected state never
/// carries an address. `address` may be `None` while connected: a remote
/// pairing that has not reported accounts yet.
#[derive(Clone, Default)]
pub struct SessionState {
	pub connected: bool,
	/// Lowercase hex account.
	pub address: Option<String>,
	pub chain_id: Option<u64>,
	pub provider: Option<ProviderRef>,
	/// Set only while a connect, disconnect or network switch is running.
	pub is_loading: bool,
	pub selected_wallet: Option<WalletDescriptor>,
}

impl SessionState {
	pub fn phase(&self) -> SessionPhase {
		if self.connected {
			SessionPhase::Connected
		} else if self.is_loading {
			SessionPhase::Connecting
		} else {
			SessionPhase::Disconnected
		}
	}

	/// Returns `true` for the empty shape every reset produces.
	pub fn is_disconnected(&self) -> bool {
		!self.connected && self.address.is_none() && self.chain_id.is_none() && self.provider.is_none()
	}

	/// Connected through remote pairing, still waiting for the peer's accounts.
	pub fn is_pending_pairing(&self) -> bool {
		self.connected && self.address.is_none()
	}

	/// Serializable view without the provider handle.
	pub fn summary(&self) -> SessionSummary {
		SessionSummary {
			phase: self.phase(),
			connected: self.connected,
			address: self.address.clone(),
			chain_id: self.chain_id,
			is_loading: self.is_loading,
			selected_wallet: self.selected_wallet.as_ref().map(|w| w.id),
		}
	}
}

impl fmt::Debug for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionState")
			.field("connected", &self.connected)
			.field("address", &self.address)
			.field("chain_id", &self.chain_id)
			.field("provider", &self.provider.as_ref().map(|_| "<provider>"))
			.field("is_loading", &self.is_loading)
			.field("selected_wallet", &self.selected_wallet.as_ref().map(|w| w.id))
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub phase: SessionPhase,
	pub connected: bool,
	pub address: Option<String>,
	pub chain_id: Option<u64>,
	pub is_loading: bool,
	pub selected_wallet: Option<&'static str>,
}
