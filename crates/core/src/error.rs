//! Error taxonomy for wallet detection and session operations.

use thiserror::Error;
use wallet_protocol::{ProviderRpcError, UNRECOGNIZED_CHAIN, USER_REJECTED};

/// Result type alias for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors surfaced by the session manager and its collaborators.
///
/// Raw provider failures are converted through [`WalletError::classify`];
/// nothing a provider throws reaches callers unclassified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
	/// No injected provider exists in the host.
	#[error("No Ethereum provider found")]
	NoProvider,

	/// The wallet returned an empty account list on an explicit account request.
	#[error("No accounts returned from wallet")]
	NoAccounts,

	/// The user (or the remote peer) declined the prompt.
	#[error("User rejected the request: {0}")]
	UserRejected(String),

	/// The pairing relay or chain RPC endpoint could not be reached.
	#[error("Network error: {0}")]
	Network(String),

	/// The remote pairing session lapsed before completion.
	#[error("Pairing session expired: {0}")]
	SessionExpired(String),

	/// The target chain is not in the wallet's chain list.
	#[error("Unrecognized chain: {0}")]
	UnrecognizedChain(String),

	/// Anything else, with the provider's raw message.
	#[error("{message}")]
	Unknown { code: Option<i64>, message: String },

	/// The session context was read outside of [`SessionContext::scope`].
	///
	/// [`SessionContext::scope`]: crate::SessionContext::scope
	#[error("wallet session accessed outside of a SessionContext scope")]
	ContextMisuse,

	/// The operation needs an active provider.
	#[error("No wallet connected")]
	NotConnected,

	/// No catalog entry carries this identifier.
	#[error("Unknown wallet: {0}")]
	UnknownWallet(String),

	/// The remote pairing wallet was selected but no pairing client is configured.
	#[error("Remote pairing is not available in this environment")]
	PairingUnavailable,

	/// The operation was abandoned because `disconnect` arrived while it ran.
	#[error("Operation cancelled by disconnect")]
	Cancelled,

	/// The session driver task has stopped.
	#[error("Session manager has stopped")]
	ManagerClosed,
}

const REJECTION_MARKERS: &[&str] = &["user rejected", "user denied", "user cancelled"];
const NETWORK_MARKERS: &[&str] = &[
	"failed to publish custom payload",
	"network",
	"relay",
	"websocket",
	"socket stalled",
	"failed to fetch",
	"timed out",
	"timeout",
];
const EXPIRY_MARKERS: &[&str] = &["session not found", "session expired", "expired"];

impl WalletError {
	/// Classifies a raw provider failure.
	///
	/// Codes win over message text; message matching is case-insensitive.
	pub fn classify(err: &ProviderRpcError) -> Self {
		let message = err.message.clone();
		if err.has_code(USER_REJECTED) {
			return WalletError::UserRejected(message);
		}
		if err.has_code(UNRECOGNIZED_CHAIN) {
			return WalletError::UnrecognizedChain(message);
		}

		let lower = message.to_lowercase();
		let contains = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

		if contains(REJECTION_MARKERS) {
			WalletError::UserRejected(message)
		} else if lower.contains("unrecognized chain") {
			WalletError::UnrecognizedChain(message)
		} else if contains(EXPIRY_MARKERS) {
			WalletError::SessionExpired(message)
		} else if contains(NETWORK_MARKERS) {
			WalletError::Network(message)
		} else if lower.contains("not detected") || lower.contains("no ethereum provider") {
			WalletError::NoProvider
		} else if lower.contains("no accounts returned") {
			WalletError::NoAccounts
		} else {
			WalletError::Unknown { code: err.code, message }
		}
	}

	/// Returns true for failures worth retrying (transient network trouble).
	pub fn is_retryable(&self) -> bool {
		matches!(self, WalletError::Network(_))
	}

	/// Returns true if the user or peer declined.
	pub fn is_user_rejection(&self) -> bool {
		matches!(self, WalletError::UserRejected(_))
	}

	/// Stable snake_case name of the error class.
	pub fn kind(&self) -> &'static str {
		match self {
			WalletError::NoProvider => "no_provider",
			WalletError::NoAccounts => "no_accounts",
			WalletError::UserRejected(_) => "user_rejected",
			WalletError::Network(_) => "network",
			WalletError::SessionExpired(_) => "session_expired",
			WalletError::UnrecognizedChain(_) => "unrecognized_chain",
			WalletError::Unknown { .. } => "unknown",
			WalletError::ContextMisuse => "context_misuse",
			WalletError::NotConnected => "not_connected",
			WalletError::UnknownWallet(_) => "unknown_wallet",
			WalletError::PairingUnavailable => "pairing_unavailable",
			WalletError::Cancelled => "cancelled",
			WalletError::ManagerClosed => "manager_closed",
		}
	}
}

impl From<ProviderRpcError> for WalletError {
	fn from(err: ProviderRpcError) -> Self {
		WalletError::classify(&err)
	}
}
