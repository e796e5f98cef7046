//! Session manager behaviour against scripted providers.

use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use tokio::task::LocalSet;
use wallet::protocol::{ProviderEvent, ProviderRpcError, methods};
use wallet::testing::{MockHost, MockPairingClient, MockProvider};
use wallet::{InjectedProviders, ProviderRef, SessionHandle, SessionManager, SessionNotice, SessionPhase, WalletConfig, WalletEnvironment, WalletError};

/// Logs to the test output; filter with `RUST_LOG=wallet=debug`.
fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

fn start(env: WalletEnvironment) -> SessionHandle {
	init_tracing();
	let (handle, driver) = SessionManager::new(env, WalletConfig::default());
	tokio::task::spawn_local(driver.run());
	handle
}

fn injected_env(injected: InjectedProviders) -> WalletEnvironment {
	WalletEnvironment::new(MockHost::new(injected))
}

fn remote_env(provider: &Rc<MockProvider>) -> WalletEnvironment {
	injected_env(InjectedProviders::none()).with_pairing(MockPairingClient::new(Rc::clone(provider)))
}

fn wallet(flags: &[&str], account: &str, chain: &str) -> Rc<MockProvider> {
	let provider = MockProvider::with_flags(flags);
	provider.respond(methods::ETH_REQUEST_ACCOUNTS, json!([account]));
	provider.respond(methods::ETH_CHAIN_ID, json!(chain));
	provider
}

fn as_ref(provider: &Rc<MockProvider>) -> ProviderRef {
	Rc::clone(provider) as ProviderRef
}

/// Lets the driver drain its queue: the paused clock only advances once
/// every task is idle.
async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn metamask_connects_through_request_accounts() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xABCdef", "0x1");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			let mut notices = handle.notices();

			handle.connect("metamask").await.unwrap();

			let state = handle.state();
			assert!(state.connected);
			assert!(!state.is_loading);
			assert_eq!(state.address.as_deref(), Some("0xabcdef"));
			assert_eq!(state.chain_id, Some(1));
			assert_eq!(state.selected_wallet.map(|w| w.id), Some("metamask"));
			assert!(Rc::ptr_eq(&state.provider.unwrap(), &as_ref(&metamask)));
			assert_eq!(metamask.call_count(methods::ETH_REQUEST_ACCOUNTS), 1);
			assert_eq!(notices.try_recv().unwrap(), SessionNotice::Connected { wallet: "MetaMask" });
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn zero_accounts_is_a_hard_failure() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			metamask.respond(methods::ETH_REQUEST_ACCOUNTS, json!([]));
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			let mut notices = handle.notices();

			let err = handle.connect("metamask").await.unwrap_err();
			assert_eq!(err, WalletError::NoAccounts);

			let state = handle.state();
			assert!(state.is_disconnected());
			assert!(!state.is_loading);
			assert!(state.selected_wallet.is_none());
			assert_eq!(metamask.listener_count(), 0);

			let notice = notices.try_recv().unwrap();
			assert_eq!(notice.message(), "No accounts available. Please unlock your wallet and try again.");
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn missing_provider_reports_not_installed() {
	LocalSet::new()
		.run_until(async {
			let handle = start(injected_env(InjectedProviders::none()));
			let mut notices = handle.notices();

			assert_eq!(handle.connect("trust").await, Err(WalletError::NoProvider));
			assert_eq!(notices.try_recv().unwrap().message(), "Trust Wallet is not installed. Please install it first.");
			assert_eq!(handle.connect("phantom").await, Err(WalletError::UnknownWallet("phantom".into())));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn rejection_is_classified() {
	LocalSet::new()
		.run_until(async {
			let metamask = MockProvider::with_flags(&["isMetaMask"]);
			metamask.fail(methods::ETH_REQUEST_ACCOUNTS, ProviderRpcError::new(4001, "User rejected the request."));
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));

			let err = handle.connect("metamask").await.unwrap_err();
			assert!(err.is_user_rejection());
			assert!(handle.state().is_disconnected());
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn generic_browser_wallet_uses_top_level_provider() {
	LocalSet::new()
		.run_until(async {
			let generic = wallet(&[], "0x1234", "0x38");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&generic))));

			handle.connect("browser").await.unwrap();
			assert_eq!(handle.state().chain_id, Some(56));
			assert_eq!(generic.call_count(methods::ETH_REQUEST_ACCOUNTS), 1);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn empty_accounts_event_resets_session() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();
			let mut notices = handle.notices();

			metamask.emit(ProviderEvent::AccountsChanged(vec!["0xDEF".into()]));
			metamask.emit(ProviderEvent::ChainChanged(137));
			settle().await;
			let state = handle.state();
			assert_eq!(state.address.as_deref(), Some("0xdef"));
			assert_eq!(state.chain_id, Some(137));

			metamask.emit(ProviderEvent::AccountsChanged(vec![]));
			settle().await;
			let state = handle.state();
			assert!(state.is_disconnected());
			assert!(state.selected_wallet.is_none());
			assert_eq!(metamask.listener_count(), 0);
			assert_eq!(notices.try_recv().unwrap(), SessionNotice::Disconnected);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn provider_disconnect_event_resets_session() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();

			metamask.emit(ProviderEvent::Disconnect {
				error: Some(ProviderRpcError::new(4900, "disconnected")),
			});
			settle().await;
			assert!(handle.state().is_disconnected());
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_resets_even_when_provider_throws() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			metamask.fail_disconnect(ProviderRpcError::without_code("disconnect not supported"));
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();

			handle.disconnect().await.unwrap();
			let state = handle.state();
			assert!(state.is_disconnected());
			assert!(!state.is_loading);
			assert_eq!(metamask.disconnect_calls(), 1);
			assert_eq!(metamask.listener_count(), 0);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn unrecognized_chain_is_added_then_switched() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			metamask.respond_once(
				methods::WALLET_SWITCH_ETHEREUM_CHAIN,
				Err(ProviderRpcError::new(4902, "Unrecognized chain ID \"0x89\"")),
			);
			metamask.respond(methods::WALLET_SWITCH_ETHEREUM_CHAIN, json!(null));
			metamask.respond(methods::WALLET_ADD_ETHEREUM_CHAIN, json!(null));
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();

			handle.switch_network(137).await.unwrap();

			let calls: Vec<_> = metamask
				.calls()
				.into_iter()
				.filter(|c| c.method.starts_with("wallet_"))
				.collect();
			let sequence: Vec<_> = calls.iter().map(|c| c.method.as_str()).collect();
			assert_eq!(
				sequence,
				[methods::WALLET_SWITCH_ETHEREUM_CHAIN, methods::WALLET_ADD_ETHEREUM_CHAIN, methods::WALLET_SWITCH_ETHEREUM_CHAIN]
			);

			let added = &calls[1].params.as_ref().unwrap()[0];
			assert_eq!(added["chainId"], "0x89");
			assert_eq!(added["nativeCurrency"]["symbol"], "ETH");
			assert_eq!(added["nativeCurrency"]["decimals"], 18);
			assert_eq!(calls[2].params, Some(json!([{ "chainId": "0x89" }])));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn failed_add_chain_leaves_state_unchanged() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			metamask.fail(methods::WALLET_SWITCH_ETHEREUM_CHAIN, ProviderRpcError::new(4902, "Unrecognized chain"));
			metamask.fail(methods::WALLET_ADD_ETHEREUM_CHAIN, ProviderRpcError::new(4001, "User rejected the request."));
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();
			let before = handle.state().summary();
			let mut notices = handle.notices();

			let err = handle.switch_network(137).await.unwrap_err();
			assert!(err.is_user_rejection());
			assert_eq!(handle.state().summary(), before);
			assert_eq!(metamask.call_count(methods::WALLET_SWITCH_ETHEREUM_CHAIN), 1);

			let notice = notices.try_recv().unwrap();
			assert!(notice.is_error());
			assert_eq!(notice.message(), "Failed to switch network");
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn switch_requires_connection() {
	LocalSet::new()
		.run_until(async {
			let handle = start(injected_env(InjectedProviders::none()));
			assert_eq!(handle.switch_network(1).await, Err(WalletError::NotConnected));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn balance_reads_return_none_on_failure() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xabc", "0x1");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			assert_eq!(handle.get_balance("0xabc").await, None);

			handle.connect("metamask").await.unwrap();
			assert_eq!(handle.get_balance("0xabc").await, None);

			metamask.respond(methods::ETH_GET_BALANCE, json!("0xde0b6b3a7640000"));
			assert_eq!(handle.get_balance("0xabc").await.as_deref(), Some("0xde0b6b3a7640000"));
			let last = metamask.calls().pop().unwrap();
			assert_eq!(last.params, Some(json!(["0xabc", "latest"])));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn overlapping_connects_run_in_call_order() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			let coinbase = wallet(&["isCoinbaseWallet"], "0xbbb", "0x1");
			let env = injected_env(InjectedProviders::with_collection(as_ref(&metamask), vec![as_ref(&metamask), as_ref(&coinbase)]));
			let handle = start(env);

			let (first, second) = tokio::join!(handle.connect("metamask"), handle.connect("coinbase"));
			assert!(first.is_ok());
			assert!(second.is_ok());

			let state = handle.state();
			assert_eq!(state.address.as_deref(), Some("0xbbb"));
			assert_eq!(state.selected_wallet.map(|w| w.id), Some("coinbase"));
			assert_eq!(metamask.listener_count(), 0);
			assert_eq!(coinbase.listener_count(), 1);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn events_from_replaced_provider_are_dropped() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			let coinbase = wallet(&["isCoinbaseWallet"], "0xbbb", "0x1");
			let env = injected_env(InjectedProviders::with_collection(as_ref(&metamask), vec![as_ref(&metamask), as_ref(&coinbase)]));
			let handle = start(env);
			handle.connect("metamask").await.unwrap();

			// The event is queued behind the switch, under the old generation.
			let (switched, ()) = tokio::join!(handle.connect("coinbase"), async {
				metamask.emit(ProviderEvent::AccountsChanged(vec![]));
			});
			switched.unwrap();
			settle().await;

			let state = handle.state();
			assert!(state.connected);
			assert_eq!(state.address.as_deref(), Some("0xbbb"));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn remote_enable_retries_network_errors() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			peer.script_enable([
				Err(ProviderRpcError::without_code("Failed to publish custom payload, please try again.")),
				Err(ProviderRpcError::without_code("Failed to publish custom payload, please try again.")),
				Ok(vec!["0xabc".into()]),
			]);
			peer.respond(methods::ETH_ACCOUNTS, json!(["0xabc"]));
			peer.respond(methods::ETH_CHAIN_ID, json!("0x1"));
			let handle = start(remote_env(&peer));
			let mut notices = handle.notices();

			handle.connect("walletconnect").await.unwrap();

			let state = handle.state();
			assert!(state.connected);
			assert_eq!(state.address.as_deref(), Some("0xabc"));

			let calls = peer.enable_calls();
			assert_eq!(calls.len(), 3);
			assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
			assert_eq!(calls[2] - calls[1], Duration::from_secs(1));
			assert_eq!(notices.try_recv().unwrap(), SessionNotice::Connected { wallet: "WalletConnect" });
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn remote_without_accounts_stays_pending() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			peer.script_enable([Ok(vec![])]);
			peer.respond(methods::ETH_ACCOUNTS, json!([]));
			let handle = start(remote_env(&peer));
			let mut notices = handle.notices();

			handle.connect("walletconnect").await.unwrap();
			let state = handle.state();
			assert!(state.is_pending_pairing());
			assert_eq!(state.chain_id, None);
			assert_eq!(notices.try_recv().unwrap(), SessionNotice::PairingPending);

			peer.emit(ProviderEvent::Connect { chain_id: Some(1) });
			peer.emit(ProviderEvent::AccountsChanged(vec!["0xabc".into()]));
			settle().await;
			let state = handle.state();
			assert_eq!(state.address.as_deref(), Some("0xabc"));
			assert_eq!(state.chain_id, Some(1));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn live_remote_session_skips_enable() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			peer.set_connected(true);
			peer.respond(methods::ETH_ACCOUNTS, json!(["0xAbc"]));
			peer.respond(methods::ETH_CHAIN_ID, json!("0x89"));
			let handle = start(remote_env(&peer));

			handle.connect("walletconnect").await.unwrap();
			assert_eq!(handle.state().chain_id, Some(137));
			assert!(peer.enable_calls().is_empty());
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn remote_without_pairing_client_fails() {
	LocalSet::new()
		.run_until(async {
			let handle = start(injected_env(InjectedProviders::none()));
			assert_eq!(handle.connect("walletconnect").await, Err(WalletError::PairingUnavailable));
			assert!(handle.state().is_disconnected());
		})
		.await;
}

#[tokio::test]
async fn connect_wallet_only_asks_for_selection() {
	let (handle, _driver) = SessionManager::new(injected_env(InjectedProviders::none()), WalletConfig::default());
	let mut notices = handle.notices();
	handle.connect_wallet();
	assert_eq!(notices.try_recv().unwrap(), SessionNotice::SelectWallet);
	assert!(handle.state().is_disconnected());
}

#[tokio::test]
async fn stopped_driver_closes_handle() {
	let (handle, driver) = SessionManager::new(injected_env(InjectedProviders::none()), WalletConfig::default());
	drop(driver);
	assert_eq!(handle.connect("metamask").await, Err(WalletError::ManagerClosed));
}

#[tokio::test(start_paused = true)]
async fn remote_enable_out_of_retries_ends_disconnected() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			peer.script_enable((0..3).map(|_| Err(ProviderRpcError::without_code("Failed to publish custom payload, please try again."))));
			let handle = start(remote_env(&peer));
			let mut notices = handle.notices();

			let err = handle.connect("walletconnect").await.unwrap_err();
			assert_eq!(err.kind(), "network");
			assert_eq!(peer.enable_calls().len(), 3);

			let state = handle.state();
			assert!(state.is_disconnected());
			assert!(!state.is_loading);
			assert!(state.selected_wallet.is_none());
			assert_eq!(peer.listener_count(), 0);
			assert_eq!(
				notices.try_recv().unwrap().message(),
				"WalletConnect network error. Please try again or use a browser wallet."
			);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_a_hung_pairing() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			let peer = MockProvider::new();
			peer.stall("enable");
			let env = injected_env(InjectedProviders::single(as_ref(&metamask))).with_pairing(MockPairingClient::new(Rc::clone(&peer)));
			let handle = start(env);

			let connecting = tokio::task::spawn_local({
				let handle = handle.clone();
				async move { handle.connect("walletconnect").await }
			});
			settle().await;
			let state = handle.state();
			assert!(state.is_loading);
			assert_eq!(state.phase(), SessionPhase::Connecting);
			assert_eq!(state.selected_wallet.map(|w| w.id), Some("walletconnect"));

			handle.disconnect().await.unwrap();
			assert_eq!(connecting.await.unwrap(), Err(WalletError::Cancelled));

			let state = handle.state();
			assert!(state.is_disconnected());
			assert!(!state.is_loading);
			assert!(state.selected_wallet.is_none());
			assert_eq!(peer.disconnect_calls(), 1);
			assert_eq!(peer.listener_count(), 0);

			handle.connect("metamask").await.unwrap();
			assert_eq!(handle.state().address.as_deref(), Some("0xaaa"));
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_commands_queued_behind_it() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			let peer = MockProvider::new();
			peer.stall("enable");
			let env = injected_env(InjectedProviders::single(as_ref(&metamask))).with_pairing(MockPairingClient::new(Rc::clone(&peer)));
			let handle = start(env);

			let spawn_connect = |id: &'static str| {
				let handle = handle.clone();
				tokio::task::spawn_local(async move { handle.connect(id).await })
			};
			let pairing = spawn_connect("walletconnect");
			settle().await;
			let queued = spawn_connect("metamask");
			settle().await;

			handle.disconnect().await.unwrap();
			assert_eq!(pairing.await.unwrap(), Err(WalletError::Cancelled));
			assert_eq!(queued.await.unwrap(), Err(WalletError::Cancelled));
			assert!(handle.state().is_disconnected());
			assert_eq!(metamask.call_count(methods::ETH_REQUEST_ACCOUNTS), 0);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn loading_is_set_while_switch_runs_and_disconnect_preempts_it() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			metamask.stall(methods::WALLET_SWITCH_ETHEREUM_CHAIN);
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();
			let mut notices = handle.notices();

			let switching = tokio::task::spawn_local({
				let handle = handle.clone();
				async move { handle.switch_network(137).await }
			});
			settle().await;
			let state = handle.state();
			assert!(state.is_loading);
			assert_eq!(state.phase(), SessionPhase::Connected);

			handle.disconnect().await.unwrap();
			assert_eq!(switching.await.unwrap(), Err(WalletError::Cancelled));
			assert!(handle.state().is_disconnected());
			assert_eq!(metamask.disconnect_calls(), 1);
			assert_eq!(notices.try_recv().unwrap(), SessionNotice::Disconnected);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn loading_is_set_while_disconnect_runs() {
	LocalSet::new()
		.run_until(async {
			let metamask = wallet(&["isMetaMask"], "0xaaa", "0x1");
			metamask.stall("disconnect");
			let handle = start(injected_env(InjectedProviders::single(as_ref(&metamask))));
			handle.connect("metamask").await.unwrap();

			tokio::task::spawn_local({
				let handle = handle.clone();
				async move { handle.disconnect().await }
			});
			settle().await;
			assert!(handle.state().is_loading);
			assert_eq!(metamask.disconnect_calls(), 1);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn restore_reattaches_live_pairing_session() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			peer.set_connected(true);
			peer.respond(methods::ETH_ACCOUNTS, json!(["0xAbc"]));
			peer.respond(methods::ETH_CHAIN_ID, json!("0x1"));
			let handle = start(remote_env(&peer));
			let mut notices = handle.notices();

			assert_eq!(handle.restore().await, Ok(true));
			let state = handle.state();
			assert!(state.connected);
			assert!(!state.is_loading);
			assert_eq!(state.address.as_deref(), Some("0xabc"));
			assert_eq!(state.chain_id, Some(1));
			assert_eq!(state.selected_wallet.map(|w| w.id), Some("walletconnect"));
			assert!(peer.enable_calls().is_empty());
			assert!(notices.try_recv().is_err());

			peer.emit(ProviderEvent::ChainChanged(137));
			settle().await;
			assert_eq!(handle.state().chain_id, Some(137));

			// A second restore leaves the active session alone.
			assert_eq!(handle.restore().await, Ok(false));
			assert_eq!(peer.listener_count(), 1);
		})
		.await;
}

#[tokio::test(start_paused = true)]
async fn restore_without_live_session_changes_nothing() {
	LocalSet::new()
		.run_until(async {
			let peer = MockProvider::new();
			let handle = start(remote_env(&peer));
			assert_eq!(handle.restore().await, Ok(false));
			assert!(handle.state().is_disconnected());
			assert_eq!(peer.listener_count(), 0);
			assert_eq!(peer.call_count(methods::ETH_ACCOUNTS), 0);

			let unpaired = start(injected_env(InjectedProviders::none()));
			assert_eq!(unpaired.restore().await, Ok(false));
		})
		.await;
}
