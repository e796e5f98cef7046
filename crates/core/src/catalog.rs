//! The supported wallet catalog.
//!
//! Four browser-extension wallets, each detected independently, plus the
//! remote pairing option. A generic "Browser Wallet" entry is synthesized
//! when something is injected but none of the known identities claim it.

use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::config::WalletConfig;
use crate::environment::{InjectedProviders, WalletEnvironment};
use crate::error::{Result, WalletError};
use crate::kind::WalletKind;
use crate::locator::{is_wallet_installed, locate_provider};
use crate::pairing;
use crate::provider::ProviderRef;

/// Identifier of the remote pairing entry.
pub const WALLETCONNECT_ID: &str = "walletconnect";
/// Identifier of the synthesized generic entry.
pub const BROWSER_WALLET_ID: &str = "browser";

/// How a descriptor produces its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum Connector {
	/// Locate the injected provider claiming this identity.
	Injected(WalletKind),
	/// Initialize a remote pairing provider.
	Remote,
	/// Use the top-level injected provider as is.
	Generic,
}

/// Static catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDescriptor {
	pub id: &'static str,
	pub name: &'static str,
	pub icon: &'static str,
	pub description: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub download_url: Option<&'static str>,
	pub connector: Connector,
}

impl WalletDescriptor {
	/// Returns `true` for the remote pairing entry.
	pub fn is_remote(&self) -> bool {
		self.connector == Connector::Remote
	}

	/// Whether this entry can be used in `env` right now.
	///
	/// The remote entry is always installed: its installation is a relayed
	/// session, not a local extension.
	pub fn is_installed(&self, env: &InjectedProviders) -> bool {
		match self.connector {
			Connector::Injected(kind) => is_wallet_installed(env, kind.id()),
			Connector::Remote => true,
			Connector::Generic => env.fallback().is_some(),
		}
	}

	/// The provider factory: resolves a connectable provider for this entry.
	pub async fn connect_provider(&self, env: &WalletEnvironment, config: &WalletConfig) -> Result<ProviderRef> {
		match self.connector {
			Connector::Injected(kind) => locate_provider(&env.injected(), kind.id()),
			Connector::Remote => pairing::init_provider(env, config).await,
			Connector::Generic => env.injected().fallback().map(Rc::clone).ok_or(WalletError::NoProvider),
		}
	}
}

static CATALOG: [WalletDescriptor; 5] = [
	WalletDescriptor {
		id: "metamask",
		name: "MetaMask",
		icon: "🦊",
		description: "Connect using MetaMask browser extension",
		download_url: Some("https://metamask.io/download/"),
		connector: Connector::Injected(WalletKind::MetaMask),
	},
	WalletDescriptor {
		id: "coinbase",
		name: "Coinbase Wallet",
		icon: "🔵",
		description: "Connect using Coinbase Wallet",
		download_url: Some("https://www.coinbase.com/wallet"),
		connector: Connector::Injected(WalletKind::Coinbase),
	},
	WalletDescriptor {
		id: "trust",
		name: "Trust Wallet",
		icon: "⚡",
		description: "Connect using Trust Wallet",
		download_url: Some("https://trustwallet.com/"),
		connector: Connector::Injected(WalletKind::Trust),
	},
	WalletDescriptor {
		id: "brave",
		name: "Brave Wallet",
		icon: "🦁",
		description: "Connect using Brave browser wallet",
		download_url: Some("https://brave.com/wallet/"),
		connector: Connector::Injected(WalletKind::Brave),
	},
	WalletDescriptor {
		id: WALLETCONNECT_ID,
		name: "WalletConnect",
		icon: "🔗",
		description: "Connect using WalletConnect protocol",
		download_url: None,
		connector: Connector::Remote,
	},
];

static BROWSER_WALLET: WalletDescriptor = WalletDescriptor {
	id: BROWSER_WALLET_ID,
	name: "Browser Wallet",
	icon: "🌐",
	description: "Connect using any browser wallet",
	download_url: None,
	connector: Connector::Generic,
};

/// The fixed catalog, in display order.
pub fn catalog() -> &'static [WalletDescriptor] {
	&CATALOG
}

/// The generic entry bound to the top-level injected provider.
pub fn browser_wallet() -> &'static WalletDescriptor {
	&BROWSER_WALLET
}

/// Looks up a descriptor by identifier, including the generic entry.
pub fn find(id: &str) -> Option<&'static WalletDescriptor> {
	CATALOG.iter().chain(std::iter::once(&BROWSER_WALLET)).find(|d| d.id == id)
}

/// A descriptor with its installed flag for one detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAvailability {
	#[serde(flatten)]
	pub descriptor: WalletDescriptor,
	pub installed: bool,
}

impl WalletAvailability {
	pub fn id(&self) -> &'static str {
		self.descriptor.id
	}
}

/// Evaluates every catalog entry against `env`, in catalog order.
///
/// Appends the generic entry when a top-level provider exists and none of
/// the known injected identities is installed.
pub fn availability(env: &InjectedProviders) -> Vec<WalletAvailability> {
	let mut wallets: Vec<WalletAvailability> = CATALOG
		.iter()
		.map(|descriptor| WalletAvailability {
			descriptor: descriptor.clone(),
			installed: descriptor.is_installed(env),
		})
		.collect();

	let has_specific_wallet = wallets.iter().any(|w| w.installed && !w.descriptor.is_remote());
	if !has_specific_wallet && env.fallback().is_some() {
		debug!(target = "wallet.detect", "no known wallet claims the injected provider; adding browser wallet");
		wallets.push(WalletAvailability {
			descriptor: BROWSER_WALLET.clone(),
			installed: true,
		});
	}

	wallets
}
