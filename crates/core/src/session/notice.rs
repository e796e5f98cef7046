use crate::error::WalletError;

/// Discrete outcome of a session operation, rendered by the page as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
	/// A connect finished with an account.
	Connected { wallet: &'static str },
	/// Remote pairing started; the peer has not approved yet.
	PairingPending,
	ConnectFailed { wallet: &'static str, error: WalletError },
	Disconnected,
	NetworkSwitchFailed { chain_id: u64, error: WalletError },
	/// A connect was requested without choosing a wallet.
	SelectWallet,
}

impl SessionNotice {
	/// Returns `true` for failure notices.
	pub fn is_error(&self) -> bool {
		matches!(self, SessionNotice::ConnectFailed { .. } | SessionNotice::NetworkSwitchFailed { .. })
	}

	/// User-facing text.
	pub fn message(&self) -> String {
		match self {
			SessionNotice::Connected { wallet } => format!("{wallet} connected successfully!"),
			SessionNotice::PairingPending => {
				"WalletConnect connection initiated! Please complete the connection in your wallet.".to_string()
			}
			SessionNotice::ConnectFailed { wallet, error } => match error {
				WalletError::UserRejected(_) => "User rejected the connection request".to_string(),
				WalletError::NoProvider => format!("{wallet} is not installed. Please install it first."),
				WalletError::NoAccounts => "No accounts available. Please unlock your wallet and try again.".to_string(),
				WalletError::Network(_) => "WalletConnect network error. Please try again or use a browser wallet.".to_string(),
				WalletError::SessionExpired(_) => "WalletConnect session expired. Please try again.".to_string(),
				other => format!("Failed to connect to {wallet}: {other}"),
			},
			SessionNotice::Disconnected => "Wallet disconnected".to_string(),
			SessionNotice::NetworkSwitchFailed { .. } => "Failed to switch network".to_string(),
			SessionNotice::SelectWallet => "Please select a wallet from the list".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn failure_messages_follow_error_class() {
		let failed = |error| SessionNotice::ConnectFailed { wallet: "MetaMask", error };
		assert_eq!(failed(WalletError::NoProvider).message(), "MetaMask is not installed. Please install it first.");
		assert_eq!(failed(WalletError::UserRejected("no".into())).message(), "User rejected the connection request");
		assert_eq!(
			failed(WalletError::Unknown { code: None, message: "boom".into() }).message(),
			"Failed to connect to MetaMask: boom"
		);
		assert!(failed(WalletError::NoAccounts).is_error());
		assert!(!SessionNotice::Disconnected.is_error());
	}
}
