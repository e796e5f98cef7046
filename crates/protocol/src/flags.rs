//! Self-reported capability flags on injected provider objects.

use serde::{Deserialize, Serialize};

/// Property names read off an injected provider, in declaration order.
pub const FLAG_NAMES: [&str; 6] = [
	"isMetaMask",
	"isCoinbaseWallet",
	"isCoinbaseWalletExtension",
	"isCoinbaseWalletApp",
	"isTrust",
	"isBraveWallet",
];

/// Boolean identity claims a provider makes about itself.
///
/// Missing properties read as `false`. A single provider may claim several
/// identities (Brave, for example, also sets `isMetaMask`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
	#[serde(rename = "isMetaMask", default)]
	pub is_metamask: bool,
	#[serde(rename = "isCoinbaseWallet", default)]
	pub is_coinbase_wallet: bool,
	#[serde(rename = "isCoinbaseWalletExtension", default)]
	pub is_coinbase_wallet_extension: bool,
	#[serde(rename = "isCoinbaseWalletApp", default)]
	pub is_coinbase_wallet_app: bool,
	#[serde(rename = "isTrust", default)]
	pub is_trust: bool,
	#[serde(rename = "isBraveWallet", default)]
	pub is_brave_wallet: bool,
}

impl CapabilityFlags {
	/// Sets the flag called `name`. Returns `false` for unknown names.
	pub fn set(&mut self, name: &str, value: bool) -> bool {
		let slot = match name {
			"isMetaMask" => &mut self.is_metamask,
			"isCoinbaseWallet" => &mut self.is_coinbase_wallet,
			"isCoinbaseWalletExtension" => &mut self.is_coinbase_wallet_extension,
			"isCoinbaseWalletApp" => &mut self.is_coinbase_wallet_app,
			"isTrust" => &mut self.is_trust,
			"isBraveWallet" => &mut self.is_brave_wallet,
			_ => return false,
		};
		*slot = value;
		true
	}

	/// Builds flags from the names that read `true`.
	pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
		let mut flags = Self::default();
		for name in names {
			flags.set(name, true);
		}
		flags
	}

	/// Returns `true` when no identity is claimed.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_wallet_property_names() {
		let flags: CapabilityFlags = serde_json::from_str(r#"{"isMetaMask": true, "isBraveWallet": true}"#).unwrap();
		assert!(flags.is_metamask);
		assert!(flags.is_brave_wallet);
		assert!(!flags.is_trust);
	}

	#[test]
	fn from_names_ignores_unknown_properties() {
		let flags = CapabilityFlags::from_names(["isTrust", "isRabby"]);
		assert_eq!(flags, CapabilityFlags { is_trust: true, ..Default::default() });
		assert!(CapabilityFlags::default().is_empty());
	}
}
