//! Chain identifiers, quantities and `wallet_addEthereumChain` parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ethereum mainnet chain id.
pub const ETHEREUM_MAINNET: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

/// Parameter object for `wallet_addEthereumChain` (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
	/// Hex-encoded chain id (`0x1`).
	pub chain_id: String,
	pub chain_name: String,
	pub native_currency: NativeCurrency,
	pub rpc_urls: Vec<String>,
	pub block_explorer_urls: Vec<String>,
}

impl AddEthereumChainParameter {
	/// Ethereum mainnet registration parameters, advertised under `chain_id`.
	pub fn ethereum_mainnet(chain_id: u64) -> Self {
		Self {
			chain_id: chain_id_to_hex(chain_id),
			chain_name: "Ethereum".to_string(),
			native_currency: NativeCurrency {
				name: "Ethereum".to_string(),
				symbol: "ETH".to_string(),
				decimals: 18,
			},
			rpc_urls: vec!["https://mainnet.infura.io/v3/".to_string()],
			block_explorer_urls: vec!["https://etherscan.io".to_string()],
		}
	}
}

/// Formats a chain id the way providers expect it (`0x89`).
pub fn chain_id_to_hex(chain_id: u64) -> String {
	format!("0x{chain_id:x}")
}

/// Reads a chain id from a hex string, a decimal string or a JSON number.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => {
			let s = s.trim();
			match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
				Some(hex) => u64::from_str_radix(hex, 16).ok(),
				None => s.parse().ok(),
			}
		}
		_ => None,
	}
}

/// Lowercases a hex account address.
pub fn normalize_address(address: &str) -> String {
	address.trim().to_ascii_lowercase()
}

/// Reads an account list, skipping non-string entries.
pub fn parse_accounts(value: &Value) -> Vec<String> {
	value
		.as_array()
		.map(|accounts| accounts.iter().filter_map(Value::as_str).map(normalize_address).collect())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn chain_ids_parse_from_all_encodings() {
		assert_eq!(parse_chain_id(&json!("0x1")), Some(1));
		assert_eq!(parse_chain_id(&json!("0xa86a")), Some(43114));
		assert_eq!(parse_chain_id(&json!("56")), Some(56));
		assert_eq!(parse_chain_id(&json!(137)), Some(137));
		assert_eq!(parse_chain_id(&json!("0xzz")), None);
		assert_eq!(parse_chain_id(&Value::Null), None);
	}

	#[test]
	fn mainnet_parameters_are_fixed() {
		let param = AddEthereumChainParameter::ethereum_mainnet(ETHEREUM_MAINNET);
		let value = serde_json::to_value(&param).unwrap();
		assert_eq!(value["chainId"], "0x1");
		assert_eq!(value["chainName"], "Ethereum");
		assert_eq!(value["nativeCurrency"]["decimals"], 18);
		assert_eq!(value["blockExplorerUrls"][0], "https://etherscan.io");
	}

	#[test]
	fn accounts_are_lowercased_and_filtered() {
		assert_eq!(parse_accounts(&json!(["0xAbC", 7, "0xDEF"])), vec!["0xabc", "0xdef"]);
		assert!(parse_accounts(&json!({})).is_empty());
	}
}
