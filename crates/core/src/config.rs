//! Wallet configuration.
//!
//! Carries the remote pairing project identifier, the app metadata shown to
//! the peer wallet, and the timing knobs of the connect and detection flows.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wallet_protocol::ETHEREUM_MAINNET;

use crate::pairing::PairingOptions;

/// Environment variable holding the pairing project identifier.
pub const PROJECT_ID_ENV: &str = "WALLETCONNECT_PROJECT_ID";
/// Project identifier used when [`PROJECT_ID_ENV`] is unset or empty.
pub const FALLBACK_PROJECT_ID: &str = "2f05a7f4c39a5c0b8b8b8b8b8b8b8b8b8";

/// App metadata presented to the peer wallet during pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppMetadata {
	pub name: String,
	pub description: String,
	pub url: String,
	pub icons: Vec<String>,
}

impl Default for AppMetadata {
	fn default() -> Self {
		Self {
			name: "Carbon Pepe X Token Sale".to_string(),
			description: "Carbon Pepe X Token Presale Platform".to_string(),
			url: String::new(),
			icons: Vec::new(),
		}
	}
}

/// Extra chains and RPC endpoints used by the second pairing initialization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FallbackRpc {
	pub optional_chains: Vec<u64>,
	pub rpc_map: BTreeMap<u64, String>,
}

impl Default for FallbackRpc {
	fn default() -> Self {
		Self {
			optional_chains: vec![137, 56, 43114],
			rpc_map: BTreeMap::from([
				(1, "https://mainnet.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161".to_string()),
				(137, "https://polygon-rpc.com".to_string()),
				(56, "https://bsc-dataseed.binance.org".to_string()),
				(43114, "https://api.avax.network/ext/bc/C/rpc".to_string()),
			]),
		}
	}
}

/// Configuration shared by detection and the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
	/// Remote pairing project identifier.
	pub project_id: String,
	pub metadata: AppMetadata,
	/// Chains required from the remote peer.
	pub chains: Vec<u64>,
	/// Whether the pairing client should display its pairing code itself.
	pub show_qr_modal: bool,
	/// Second-attempt pairing options; `None` disables the retry.
	pub fallback_rpc: Option<FallbackRpc>,
	/// Maximum `enable` attempts during remote pairing.
	pub enable_attempts: u32,
	/// Delay between `enable` attempts.
	pub enable_backoff_ms: u64,
	/// Settle delay before a detection refresh.
	pub refresh_delay_ms: u64,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			project_id: FALLBACK_PROJECT_ID.to_string(),
			metadata: AppMetadata::default(),
			chains: vec![ETHEREUM_MAINNET],
			show_qr_modal: true,
			fallback_rpc: Some(FallbackRpc::default()),
			enable_attempts: 3,
			enable_backoff_ms: 1_000,
			refresh_delay_ms: 500,
		}
	}
}

impl WalletConfig {
	/// Builds the default configuration with the project id from [`PROJECT_ID_ENV`].
	pub fn from_env() -> Self {
		Self::default().with_project_id(resolve_project_id(std::env::var(PROJECT_ID_ENV).ok()))
	}

	/// Sets the pairing project identifier.
	pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
		self.project_id = project_id.into();
		self
	}

	/// Sets the page origin, deriving the metadata url and favicon icon.
	pub fn with_origin(mut self, origin: &str) -> Self {
		let origin = origin.trim_end_matches('/');
		self.metadata.url = origin.to_string();
		self.metadata.icons = vec![format!("{origin}/favicon.ico")];
		self
	}

	pub fn with_chains(mut self, chains: Vec<u64>) -> Self {
		self.chains = chains;
		self
	}

	/// Sets the number of `enable` attempts (at least one is always made).
	pub fn with_enable_attempts(mut self, attempts: u32) -> Self {
		self.enable_attempts = attempts;
		self
	}

	pub fn with_enable_backoff(mut self, backoff: Duration) -> Self {
		self.enable_backoff_ms = backoff.as_millis() as u64;
		self
	}

	pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
		self.refresh_delay_ms = delay.as_millis() as u64;
		self
	}

	/// Disables the fallback pairing initialization.
	pub fn without_fallback_rpc(mut self) -> Self {
		self.fallback_rpc = None;
		self
	}

	pub fn enable_backoff(&self) -> Duration {
		Duration::from_millis(self.enable_backoff_ms)
	}

	pub fn refresh_delay(&self) -> Duration {
		Duration::from_millis(self.refresh_delay_ms)
	}

	/// Options for the first pairing initialization attempt.
	pub fn pairing_options(&self) -> PairingOptions {
		PairingOptions {
			project_id: self.project_id.clone(),
			chains: self.chains.clone(),
			show_qr_modal: self.show_qr_modal,
			optional_chains: Vec::new(),
			rpc_map: BTreeMap::new(),
			metadata: self.metadata.clone(),
		}
	}

	/// Options for the second attempt, carrying the fallback chains and RPC map.
	pub fn fallback_pairing_options(&self) -> Option<PairingOptions> {
		let fallback = self.fallback_rpc.as_ref()?;
		Some(PairingOptions {
			optional_chains: fallback.optional_chains.clone(),
			rpc_map: fallback.rpc_map.clone(),
			..self.pairing_options()
		})
	}
}

fn resolve_project_id(value: Option<String>) -> String {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
		.unwrap_or_else(|| FALLBACK_PROJECT_ID.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn project_id_falls_back_when_unset_or_blank() {
		assert_eq!(resolve_project_id(None), FALLBACK_PROJECT_ID);
		assert_eq!(resolve_project_id(Some("   ".into())), FALLBACK_PROJECT_ID);
		assert_eq!(resolve_project_id(Some("abc123".into())), "abc123");
	}

	#[test]
	fn origin_sets_metadata_url_and_icon() {
		let config = WalletConfig::default().with_origin("https://presale.example/");
		assert_eq!(config.metadata.url, "https://presale.example");
		assert_eq!(config.metadata.icons, vec!["https://presale.example/favicon.ico"]);
	}

	#[test]
	fn defaults_match_connect_flow_timings() {
		let config = WalletConfig::default();
		assert_eq!(config.enable_attempts, 3);
		assert_eq!(config.enable_backoff(), Duration::from_secs(1));
		assert_eq!(config.refresh_delay(), Duration::from_millis(500));
		assert_eq!(config.chains, vec![1]);
	}

	#[test]
	fn fallback_options_extend_primary_options() {
		let config = WalletConfig::default().with_project_id("p");
		let primary = config.pairing_options();
		assert!(primary.optional_chains.is_empty());

		let fallback = config.fallback_pairing_options().unwrap();
		assert_eq!(fallback.project_id, "p");
		assert_eq!(fallback.optional_chains, vec![137, 56, 43114]);
		assert_eq!(fallback.rpc_map.get(&137).map(String::as_str), Some("https://polygon-rpc.com"));

		assert!(config.without_fallback_rpc().fallback_pairing_options().is_none());
	}

	#[test]
	fn deserializes_partial_json() {
		let config: WalletConfig = serde_json::from_str(r#"{"projectId": "xyz", "enableAttempts": 5}"#).unwrap();
		assert_eq!(config.project_id, "xyz");
		assert_eq!(config.enable_attempts, 5);
		assert_eq!(config.refresh_delay_ms, 500);
	}
}
