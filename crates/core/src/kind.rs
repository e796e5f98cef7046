//! Injected wallet identities and capability-flag classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use wallet_protocol::CapabilityFlags;

/// Browser-extension wallets told apart by their capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
	MetaMask,
	Coinbase,
	Trust,
	Brave,
}

impl WalletKind {
	/// Every kind, in catalog order.
	pub const ALL: [WalletKind; 4] = [WalletKind::MetaMask, WalletKind::Coinbase, WalletKind::Trust, WalletKind::Brave];

	/// Catalog identifier for this kind.
	pub fn id(self) -> &'static str {
		match self {
			WalletKind::MetaMask => "metamask",
			WalletKind::Coinbase => "coinbase",
			WalletKind::Trust => "trust",
			WalletKind::Brave => "brave",
		}
	}

	/// Resolves a catalog identifier. Unknown identifiers yield `None`.
	pub fn from_id(id: &str) -> Option<Self> {
		WalletKind::ALL.into_iter().find(|kind| kind.id() == id)
	}

	/// Returns `true` when `flags` claim this identity.
	///
	/// Coinbase ships three different flags depending on the build.
	pub fn is_claimed_by(self, flags: &CapabilityFlags) -> bool {
		match self {
			WalletKind::MetaMask => flags.is_metamask,
			WalletKind::Coinbase => flags.is_coinbase_wallet || flags.is_coinbase_wallet_extension || flags.is_coinbase_wallet_app,
			WalletKind::Trust => flags.is_trust,
			WalletKind::Brave => flags.is_brave_wallet,
		}
	}
}

impl fmt::Display for WalletKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.id())
	}
}

/// Every identity `flags` claim, in catalog order.
pub fn classify(flags: &CapabilityFlags) -> Vec<WalletKind> {
	WalletKind::ALL.into_iter().filter(|kind| kind.is_claimed_by(flags)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_round_trip() {
		for kind in WalletKind::ALL {
			assert_eq!(WalletKind::from_id(kind.id()), Some(kind));
		}
		assert_eq!(WalletKind::from_id("phantom"), None);
		assert_eq!(WalletKind::from_id("MetaMask"), None);
	}

	#[test]
	fn any_coinbase_flag_claims_coinbase() {
		for name in ["isCoinbaseWallet", "isCoinbaseWalletExtension", "isCoinbaseWalletApp"] {
			let flags = CapabilityFlags::from_names([name]);
			assert_eq!(classify(&flags), vec![WalletKind::Coinbase], "{name}");
		}
	}

	#[test]
	fn brave_may_also_claim_metamask() {
		let flags = CapabilityFlags::from_names(["isMetaMask", "isBraveWallet"]);
		assert_eq!(classify(&flags), vec![WalletKind::MetaMask, WalletKind::Brave]);
		assert!(classify(&CapabilityFlags::default()).is_empty());
	}
}
