//! Detection service: catalog availability with a busy flag.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};
use wallet_protocol::CapabilityFlags;

use crate::catalog::{self, WalletAvailability};
use crate::config::WalletConfig;
use crate::environment::WalletEnvironment;
use crate::kind::{self, WalletKind};

/// Published detection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSnapshot {
	pub wallets: Vec<WalletAvailability>,
	pub is_detecting: bool,
}

impl Default for DetectionSnapshot {
	/// Nothing detected yet; a first pass is expected to be pending.
	fn default() -> Self {
		Self {
			wallets: Vec::new(),
			is_detecting: true,
		}
	}
}

/// Raw view of the host environment, for diagnostics panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
	pub has_injected_provider: bool,
	pub has_provider_collection: bool,
	pub collection_size: usize,
	/// Flags of the top-level provider, if any.
	pub primary_flags: Option<CapabilityFlags>,
	/// Identities claimed by the top-level provider.
	pub claimed: Vec<WalletKind>,
	pub is_detecting: bool,
	pub wallets: Vec<WalletAvailability>,
}

/// Builds [`WalletAvailability`] lists on demand.
///
/// Nothing is cached: every [`detect`](Self::detect) recomputes from the host.
pub struct DetectionService {
	env: WalletEnvironment,
	refresh_delay: Duration,
	snapshot: watch::Sender<DetectionSnapshot>,
}

impl DetectionService {
	pub fn new(env: WalletEnvironment, config: &WalletConfig) -> Self {
		let (snapshot, _) = watch::channel(DetectionSnapshot::default());
		Self {
			env,
			refresh_delay: config.refresh_delay(),
			snapshot,
		}
	}

	/// Evaluates every catalog entry in catalog order.
	pub fn detect(&self) -> Vec<WalletAvailability> {
		self.snapshot.send_modify(|s| s.is_detecting = true);

		let wallets = catalog::availability(&self.env.injected());
		let installed = wallets.iter().filter(|w| w.installed).count();
		debug!(target = "wallet.detect", total = wallets.len(), installed, "detection pass complete");

		self.snapshot.send_replace(DetectionSnapshot {
			wallets: wallets.clone(),
			is_detecting: false,
		});
		wallets
	}

	/// Waits for the refresh delay, then detects from scratch.
	///
	/// The busy flag is raised for the whole wait so an extension that just
	/// announced itself has time to inject.
	pub async fn refresh(&self) -> Vec<WalletAvailability> {
		info!(target = "wallet.detect", delay_ms = self.refresh_delay.as_millis() as u64, "refreshing wallets");
		self.snapshot.send_modify(|s| s.is_detecting = true);
		self.env.timer().sleep(self.refresh_delay).await;
		self.detect()
	}

	pub fn is_detecting(&self) -> bool {
		self.snapshot.borrow().is_detecting
	}

	/// Result of the last completed pass.
	pub fn wallets(&self) -> Vec<WalletAvailability> {
		self.snapshot.borrow().wallets.clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<DetectionSnapshot> {
		self.snapshot.subscribe()
	}

	/// Inspects the host without touching the published snapshot.
	pub fn environment_report(&self) -> EnvironmentReport {
		let injected = self.env.injected();
		let primary_flags = injected.primary().map(|p| p.flags());
		EnvironmentReport {
			has_injected_provider: !injected.is_empty(),
			has_provider_collection: injected.collection().is_some(),
			collection_size: injected.collection().map_or(0, <[_]>::len),
			claimed: primary_flags.as_ref().map(kind::classify).unwrap_or_default(),
			primary_flags,
			is_detecting: self.is_detecting(),
			wallets: catalog::availability(&injected),
		}
	}
}
