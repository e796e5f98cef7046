//! Provider RPC error payloads (EIP-1193 `ProviderRpcError`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The user rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// The provider does not support the requested method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// The chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Error object thrown (or rejected) by a provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRpcError {
	/// Numeric error code, absent for plain `Error` throws.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<i64>,
	#[serde(default)]
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl ProviderRpcError {
	/// Creates an error carrying an RPC code.
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code: Some(code),
			message: message.into(),
			data: None,
		}
	}

	/// Creates a code-less error, as thrown by SDK internals.
	pub fn without_code(message: impl Into<String>) -> Self {
		Self {
			code: None,
			message: message.into(),
			data: None,
		}
	}

	/// Returns `true` when the error carries `code`.
	pub fn has_code(&self, code: i64) -> bool {
		self.code == Some(code)
	}
}

impl fmt::Display for ProviderRpcError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			Some(code) => write!(f, "{} (code {code})", self.message),
			None => f.write_str(&self.message),
		}
	}
}

impl std::error::Error for ProviderRpcError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_partial_payloads() {
		let err: ProviderRpcError = serde_json::from_str(r#"{"code": 4001, "message": "User rejected the request."}"#).unwrap();
		assert!(err.has_code(USER_REJECTED));

		let err: ProviderRpcError = serde_json::from_str(r#"{"message": "Session not found"}"#).unwrap();
		assert_eq!(err.code, None);
		assert_eq!(err.to_string(), "Session not found");
	}

	#[test]
	fn display_includes_code() {
		let err = ProviderRpcError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID");
		assert_eq!(err.to_string(), "Unrecognized chain ID (code 4902)");
	}
}
