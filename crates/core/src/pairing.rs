//! Remote pairing: provider initialization and the retried `enable` handshake.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wallet_protocol::ProviderRpcError;

use crate::config::{AppMetadata, WalletConfig};
use crate::environment::{Timer, WalletEnvironment};
use crate::error::{Result, WalletError};
use crate::provider::{Eip1193Provider, ProviderRef};

/// Options passed to the pairing client's initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingOptions {
	pub project_id: String,
	pub chains: Vec<u64>,
	pub show_qr_modal: bool,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub optional_chains: Vec<u64>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub rpc_map: BTreeMap<u64, String>,
	pub metadata: AppMetadata,
}

/// Creates remote-pairing providers (relayed sessions to another device).
#[async_trait(?Send)]
pub trait PairingClient {
	/// Initializes a provider; does not start pairing yet.
	async fn init(&self, options: &PairingOptions) -> std::result::Result<ProviderRef, ProviderRpcError>;
}

/// Initializes the remote provider, retrying once with the fallback RPC options.
pub async fn init_provider(env: &WalletEnvironment, config: &WalletConfig) -> Result<ProviderRef> {
	let client = env.pairing().ok_or(WalletError::PairingUnavailable)?;
	let options = config.pairing_options();
	info!(target = "wallet.pairing", project_id = %options.project_id, "initializing pairing provider");

	match client.init(&options).await {
		Ok(provider) => Ok(provider),
		Err(err) => {
			let Some(fallback) = config.fallback_pairing_options() else {
				return Err(err.into());
			};
			warn!(target = "wallet.pairing", error = %err, "pairing init failed; retrying with RPC map");
			client.init(&fallback).await.map_err(WalletError::from)
		}
	}
}

/// Runs `enable`, retrying network-class failures.
///
/// Makes at most `attempts` calls (at least one) with `backoff` between
/// them. Any other error class fails immediately.
pub async fn enable_with_retry(provider: &dyn Eip1193Provider, timer: &dyn Timer, attempts: u32, backoff: Duration) -> Result<Vec<String>> {
	let attempts = attempts.max(1);
	let mut attempt = 0;
	loop {
		attempt += 1;
		match provider.enable().await {
			Ok(accounts) => {
				debug!(target = "wallet.pairing", attempt, accounts = accounts.len(), "enable succeeded");
				return Ok(accounts);
			}
			Err(err) => {
				let classified = WalletError::classify(&err);
				if !classified.is_retryable() || attempt >= attempts {
					warn!(target = "wallet.pairing", attempt, error = %err, "enable failed");
					return Err(classified);
				}
				debug!(target = "wallet.pairing", attempt, error = %err, "enable failed; retrying");
				timer.sleep(backoff).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use tokio::time::Instant;

	use super::*;
	use crate::environment::{InjectedProviders, TokioTimer};
	use crate::testing::{MockHost, MockPairingClient, MockProvider};

	#[tokio::test(start_paused = true)]
	async fn enable_retries_network_errors_with_backoff() {
		let provider = MockProvider::new();
		provider.script_enable([
			Err(ProviderRpcError::without_code("Failed to publish custom payload")),
			Err(ProviderRpcError::without_code("Failed to publish custom payload")),
			Ok(vec!["0xabc".to_string()]),
		]);

		let start = Instant::now();
		let accounts = enable_with_retry(&*provider, &TokioTimer, 3, Duration::from_secs(1)).await.unwrap();
		assert_eq!(accounts, vec!["0xabc"]);
		assert_eq!(provider.enable_calls().len(), 3);
		assert_eq!(start.elapsed(), Duration::from_secs(2));
	}

	#[tokio::test(start_paused = true)]
	async fn enable_gives_up_after_last_attempt() {
		let provider = MockProvider::new();
		provider.script_enable((0..5).map(|_| Err(ProviderRpcError::without_code("relay socket stalled"))));

		let err = enable_with_retry(&*provider, &TokioTimer, 3, Duration::from_secs(1)).await.unwrap_err();
		assert_eq!(err.kind(), "network");
		assert_eq!(provider.enable_calls().len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn enable_does_not_retry_rejections() {
		let provider = MockProvider::new();
		provider.script_enable([Err(ProviderRpcError::new(4001, "User rejected"))]);

		let err = enable_with_retry(&*provider, &TokioTimer, 3, Duration::from_secs(1)).await.unwrap_err();
		assert!(err.is_user_rejection());
		assert_eq!(provider.enable_calls().len(), 1);
	}

	#[tokio::test]
	async fn init_falls_back_to_rpc_map_options() {
		let provider = MockProvider::new();
		let client = MockPairingClient::new(Rc::clone(&provider));
		client.fail_next_init(ProviderRpcError::without_code("Invalid chains"));

		let env = WalletEnvironment::new(MockHost::new(InjectedProviders::none())).with_pairing(client.clone());
		init_provider(&env, &WalletConfig::default()).await.unwrap();

		let calls = client.init_calls();
		assert_eq!(calls.len(), 2);
		assert!(calls[0].rpc_map.is_empty());
		assert_eq!(calls[1].optional_chains, vec![137, 56, 43114]);
	}

	#[tokio::test]
	async fn init_without_client_is_unavailable() {
		let env = WalletEnvironment::new(MockHost::new(InjectedProviders::none()));
		let err = init_provider(&env, &WalletConfig::default()).await.err();
		assert_eq!(err, Some(WalletError::PairingUnavailable));
	}
}
