//! Request arguments for the provider `request({ method, params })` call.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::chain::{AddEthereumChainParameter, chain_id_to_hex};

/// JSON-RPC method names issued against wallet providers.
pub mod methods {
	pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
	pub const ETH_ACCOUNTS: &str = "eth_accounts";
	pub const ETH_CHAIN_ID: &str = "eth_chainId";
	pub const ETH_GET_BALANCE: &str = "eth_getBalance";
	pub const WALLET_SWITCH_ETHEREUM_CHAIN: &str = "wallet_switchEthereumChain";
	pub const WALLET_ADD_ETHEREUM_CHAIN: &str = "wallet_addEthereumChain";
}

/// Argument object passed to `provider.request(...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
	/// RPC method name.
	pub method: String,
	/// Positional parameters, omitted entirely when the method takes none.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl RequestArguments {
	/// Creates a parameterless request.
	pub fn new(method: impl Into<String>) -> Self {
		Self {
			method: method.into(),
			params: None,
		}
	}

	/// Attaches positional parameters.
	pub fn with_params(mut self, params: Value) -> Self {
		self.params = Some(params);
		self
	}

	/// `eth_requestAccounts`, which prompts the user to authorize the page.
	pub fn request_accounts() -> Self {
		Self::new(methods::ETH_REQUEST_ACCOUNTS)
	}

	/// `eth_accounts`, which never prompts.
	pub fn accounts() -> Self {
		Self::new(methods::ETH_ACCOUNTS)
	}

	pub fn chain_id() -> Self {
		Self::new(methods::ETH_CHAIN_ID)
	}

	/// `eth_getBalance` at the `latest` block.
	pub fn get_balance(address: &str) -> Self {
		Self::new(methods::ETH_GET_BALANCE).with_params(json!([address, "latest"]))
	}

	pub fn switch_chain(chain_id: u64) -> Self {
		Self::new(methods::WALLET_SWITCH_ETHEREUM_CHAIN).with_params(json!([{ "chainId": chain_id_to_hex(chain_id) }]))
	}

	pub fn add_chain(parameter: &AddEthereumChainParameter) -> Self {
		Self::new(methods::WALLET_ADD_ETHEREUM_CHAIN).with_params(json!([parameter]))
	}
}
