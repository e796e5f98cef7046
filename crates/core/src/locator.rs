//! Provider location and installation checks.
//!
//! Both operations apply the same matching order for a wallet identifier:
//!
//! 1. The first provider in the `providers` collection claiming the identity
//! 2. The top-level provider, if it claims the identity
//!
//! The locator then falls back to the top-level provider unconditionally;
//! the installation check reports `false` instead.

use std::rc::Rc;

use tracing::debug;

use crate::environment::InjectedProviders;
use crate::error::{Result, WalletError};
use crate::kind::WalletKind;
use crate::provider::ProviderRef;

/// Returns the provider to issue requests against for `wallet_id`.
///
/// In a multi-provider host an unmatched identifier still resolves to the
/// top-level provider, so requests may reach a different wallet than the one
/// named.
///
/// # Errors
///
/// Returns [`WalletError::NoProvider`] when nothing is injected.
pub fn locate_provider(env: &InjectedProviders, wallet_id: &str) -> Result<ProviderRef> {
	let primary = env.primary().ok_or(WalletError::NoProvider)?;

	if let Some(kind) = WalletKind::from_id(wallet_id) {
		if let Some(found) = find_in_collection(env, kind) {
			debug!(target = "wallet.locator", wallet = wallet_id, "found provider in providers collection");
			return Ok(Rc::clone(found));
		}
		if kind.is_claimed_by(&primary.flags()) {
			debug!(target = "wallet.locator", wallet = wallet_id, "using top-level provider");
			return Ok(Rc::clone(primary));
		}
	}

	let fallback = env.fallback().ok_or(WalletError::NoProvider)?;
	debug!(target = "wallet.locator", wallet = wallet_id, "no identity match; falling back to top-level provider");
	Ok(Rc::clone(fallback))
}

/// Returns `true` when a provider claiming `wallet_id` is injected.
///
/// Never fails: a missing environment or an unrecognized identifier reads
/// as not installed.
pub fn is_wallet_installed(env: &InjectedProviders, wallet_id: &str) -> bool {
	let (Some(primary), Some(kind)) = (env.primary(), WalletKind::from_id(wallet_id)) else {
		return false;
	};
	find_in_collection(env, kind).is_some() || kind.is_claimed_by(&primary.flags())
}

fn find_in_collection(env: &InjectedProviders, kind: WalletKind) -> Option<&ProviderRef> {
	env.collection()?.iter().find(|provider| kind.is_claimed_by(&provider.flags()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockProvider;

	fn as_ref(mock: &Rc<MockProvider>) -> ProviderRef {
		Rc::clone(mock) as ProviderRef
	}

	#[test]
	fn empty_environment_has_no_provider() {
		let env = InjectedProviders::none();
		assert_eq!(locate_provider(&env, "metamask").err(), Some(WalletError::NoProvider));
		assert!(!is_wallet_installed(&env, "metamask"));
	}

	#[test]
	fn collection_match_wins_over_top_level() {
		let primary = MockProvider::with_flags(&["isMetaMask"]);
		let coinbase = MockProvider::with_flags(&["isCoinbaseWalletExtension"]);
		let metamask = MockProvider::with_flags(&["isMetaMask"]);
		let env = InjectedProviders::with_collection(as_ref(&primary), vec![as_ref(&coinbase), as_ref(&metamask)]);

		let located = locate_provider(&env, "metamask").unwrap();
		assert!(Rc::ptr_eq(&located, &as_ref(&metamask)));
		assert!(!Rc::ptr_eq(&located, &as_ref(&primary)));

		let located = locate_provider(&env, "coinbase").unwrap();
		assert!(Rc::ptr_eq(&located, &as_ref(&coinbase)));
	}

	#[test]
	fn top_level_used_when_collection_lacks_identity() {
		let primary = MockProvider::with_flags(&["isTrust"]);
		let other = MockProvider::with_flags(&["isMetaMask"]);
		let env = InjectedProviders::with_collection(as_ref(&primary), vec![as_ref(&other)]);

		assert!(is_wallet_installed(&env, "trust"));
		assert!(Rc::ptr_eq(&locate_provider(&env, "trust").unwrap(), &as_ref(&primary)));
	}

	#[test]
	fn unmatched_identifiers_fall_back_but_are_not_installed() {
		let primary = MockProvider::with_flags(&["isMetaMask"]);
		let env = InjectedProviders::single(as_ref(&primary));

		for id in ["brave", "trust", "coinbase", "phantom", ""] {
			assert!(!is_wallet_installed(&env, id), "{id}");
			let located = locate_provider(&env, id).unwrap();
			assert!(Rc::ptr_eq(&located, &as_ref(&primary)), "{id}");
		}
	}
}
