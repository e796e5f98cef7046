//! Wallet provider detection and connection sessions.
//!
//! The crate probes the host for injected EIP-1193 providers, tells apart
//! several simultaneously injected wallets, and runs a single connection
//! session against the chosen one.
//!
//! # Main Types
//!
//! - [`WalletEnvironment`] - Host access: injected providers, pairing client, timer
//! - [`DetectionService`] - Catalog availability with a busy flag and delayed refresh
//! - [`SessionManager`] - Builds a [`SessionHandle`] and its [`SessionDriver`] task
//! - [`SessionContext`] - Scoped accessor for the active [`SessionHandle`]
//! - [`WalletError`] - Classified failure taxonomy
//!
//! # Example
//!
//! ```ignore
//! let env = WalletEnvironment::new(host).with_pairing(pairing);
//! let (handle, driver) = SessionManager::new(env.clone(), WalletConfig::from_env());
//! tokio::task::spawn_local(driver.run());
//!
//! let detection = DetectionService::new(env, &WalletConfig::default());
//! for wallet in detection.detect() {
//!     println!("{} installed={}", wallet.descriptor.name, wallet.installed);
//! }
//! handle.connect("metamask").await?;
//! ```

pub mod catalog;
pub mod config;
pub mod detection;
pub mod environment;
pub mod error;
pub mod handlers;
pub mod kind;
pub mod locator;
pub mod pairing;
pub mod provider;
pub mod session;
pub mod testing;

pub use catalog::{Connector, WalletAvailability, WalletDescriptor};
pub use config::{AppMetadata, WalletConfig};
pub use detection::{DetectionService, DetectionSnapshot, EnvironmentReport};
pub use environment::{InjectedHost, InjectedProviders, Timer, TokioTimer, WalletEnvironment};
pub use error::{Result, WalletError};
pub use handlers::{EventEmitter, EventListener, Subscription};
pub use kind::WalletKind;
pub use locator::{is_wallet_installed, locate_provider};
pub use pairing::{PairingClient, PairingOptions};
pub use provider::{Eip1193Provider, ProviderRef};
pub use session::{SessionContext, SessionDriver, SessionHandle, SessionManager, SessionNotice, SessionPhase, SessionState, SessionSummary};
pub use wallet_protocol as protocol;
