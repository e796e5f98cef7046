//! Test doubles for the host environment.
//!
//! Lets detection and session flows run without a browser:
//! - [`MockProvider`]: Scripted EIP-1193 provider with an event emitter and call log
//! - [`MockHost`]: Injected provider set that tests can swap at runtime
//! - [`MockPairingClient`]: Remote pairing initializer returning a fixed provider
//!
//! # Example
//!
//! ```ignore
//! use wallet::testing::{MockHost, MockProvider};
//!
//! let provider = MockProvider::with_flags(&["isMetaMask"]);
//! provider.respond(methods::ETH_REQUEST_ACCOUNTS, json!(["0xabc"]));
//! provider.respond(methods::ETH_CHAIN_ID, json!("0x1"));
//!
//! let host = MockHost::new(InjectedProviders::single(provider.clone()));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use wallet_protocol::{CapabilityFlags, ProviderEvent, ProviderRpcError, RequestArguments, UNSUPPORTED_METHOD};

use crate::environment::{InjectedHost, InjectedProviders};
use crate::handlers::{EventEmitter, EventListener, Subscription};
use crate::pairing::{PairingClient, PairingOptions};
use crate::provider::{Eip1193Provider, ProviderRef};

type RpcResult<T> = std::result::Result<T, ProviderRpcError>;

#[derive(Default)]
struct MethodScript {
	once: VecDeque<RpcResult<Value>>,
	default: Option<RpcResult<Value>>,
}

/// Scripted provider.
///
/// Unscripted methods fail with code 4200. `enable` pops its own script when
/// one is set and otherwise falls back to `eth_requestAccounts`. Stalled
/// calls are logged and then never resolve.
#[derive(Default)]
pub struct MockProvider {
	flags: CapabilityFlags,
	emitter: EventEmitter,
	scripts: RefCell<HashMap<String, MethodScript>>,
	calls: RefCell<Vec<RequestArguments>>,
	connected: Cell<bool>,
	enable_script: RefCell<Option<VecDeque<RpcResult<Vec<String>>>>>,
	enable_calls: RefCell<Vec<Instant>>,
	disconnect_result: RefCell<Option<ProviderRpcError>>,
	disconnect_calls: Cell<usize>,
	stalled: RefCell<HashSet<String>>,
}

impl MockProvider {
	/// A provider claiming no identity.
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// A provider whose listed flags read `true`.
	pub fn with_flags(names: &[&str]) -> Rc<Self> {
		Rc::new(Self {
			flags: CapabilityFlags::from_names(names.iter().copied()),
			..Self::default()
		})
	}

	/// Answers every call to `method` with `value`.
	pub fn respond(&self, method: &str, value: Value) {
		self.scripts.borrow_mut().entry(method.to_string()).or_default().default = Some(Ok(value));
	}

	/// Answers the next call to `method` with `result`, ahead of the default.
	pub fn respond_once(&self, method: &str, result: RpcResult<Value>) {
		self.scripts.borrow_mut().entry(method.to_string()).or_default().once.push_back(result);
	}

	/// Fails every call to `method` with `error`.
	pub fn fail(&self, method: &str, error: ProviderRpcError) {
		self.scripts.borrow_mut().entry(method.to_string()).or_default().default = Some(Err(error));
	}

	/// Makes every later call to `name` hang. `enable` and `disconnect` are
	/// stalled under those names.
	pub fn stall(&self, name: &str) {
		self.stalled.borrow_mut().insert(name.to_string());
	}

	async fn hang_if_stalled(&self, name: &str) {
		if self.stalled.borrow().contains(name) {
			std::future::pending::<()>().await;
		}
	}

	/// Scripts successive `enable` results.
	pub fn script_enable(&self, results: impl IntoIterator<Item = RpcResult<Vec<String>>>) {
		self.enable_script.borrow_mut().get_or_insert_with(VecDeque::new).extend(results);
	}

	/// Every request issued so far, in order.
	pub fn calls(&self) -> Vec<RequestArguments> {
		self.calls.borrow().clone()
	}

	/// Number of requests issued for `method`.
	pub fn call_count(&self, method: &str) -> usize {
		self.calls.borrow().iter().filter(|c| c.method == method).count()
	}

	/// Times at which `enable` was called.
	pub fn enable_calls(&self) -> Vec<Instant> {
		self.enable_calls.borrow().clone()
	}

	/// Emits `event` to every subscribed listener.
	pub fn emit(&self, event: ProviderEvent) {
		self.emitter.emit(event);
	}

	pub fn set_connected(&self, connected: bool) {
		self.connected.set(connected);
	}

	pub fn listener_count(&self) -> usize {
		self.emitter.listener_count()
	}

	pub fn disconnect_calls(&self) -> usize {
		self.disconnect_calls.get()
	}

	/// Makes `disconnect` fail with `error`.
	pub fn fail_disconnect(&self, error: ProviderRpcError) {
		*self.disconnect_result.borrow_mut() = Some(error);
	}
}

#[async_trait(?Send)]
impl Eip1193Provider for MockProvider {
	fn flags(&self) -> CapabilityFlags {
		self.flags
	}

	async fn request(&self, args: RequestArguments) -> RpcResult<Value> {
		let method = args.method.clone();
		self.calls.borrow_mut().push(args);
		self.hang_if_stalled(&method).await;

		let mut scripts = self.scripts.borrow_mut();
		let Some(script) = scripts.get_mut(&method) else {
			return Err(ProviderRpcError::new(UNSUPPORTED_METHOD, "method not mocked"));
		};
		if let Some(result) = script.once.pop_front() {
			return result;
		}
		script
			.default
			.clone()
			.unwrap_or_else(|| Err(ProviderRpcError::new(UNSUPPORTED_METHOD, "method not mocked")))
	}

	fn subscribe(&self, listener: EventListener) -> Subscription {
		self.emitter.on(listener)
	}

	fn is_connected(&self) -> bool {
		self.connected.get()
	}

	async fn enable(&self) -> RpcResult<Vec<String>> {
		self.enable_calls.borrow_mut().push(Instant::now());
		self.hang_if_stalled("enable").await;
		let scripted = self.enable_script.borrow_mut().as_mut().map(|script| script.pop_front());
		match scripted {
			Some(Some(result)) => result,
			Some(None) => Ok(Vec::new()),
			None => {
				let accounts = self.request(RequestArguments::request_accounts()).await?;
				Ok(wallet_protocol::parse_accounts(&accounts))
			}
		}
	}

	async fn disconnect(&self) -> RpcResult<()> {
		self.disconnect_calls.set(self.disconnect_calls.get() + 1);
		self.hang_if_stalled("disconnect").await;
		match self.disconnect_result.borrow().clone() {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

/// Host whose injected providers can be replaced between inspections.
pub struct MockHost {
	injected: RefCell<InjectedProviders>,
}

impl MockHost {
	pub fn new(injected: InjectedProviders) -> Rc<Self> {
		Rc::new(Self {
			injected: RefCell::new(injected),
		})
	}

	/// Simulates an extension injecting (or removing) providers.
	pub fn set(&self, injected: InjectedProviders) {
		*self.injected.borrow_mut() = injected;
	}
}

impl InjectedHost for MockHost {
	fn injected(&self) -> InjectedProviders {
		self.injected.borrow().clone()
	}
}

/// Pairing client handing out one provider, with scriptable init failures.
pub struct MockPairingClient {
	provider: Rc<MockProvider>,
	failures: RefCell<VecDeque<ProviderRpcError>>,
	init_calls: RefCell<Vec<PairingOptions>>,
}

impl MockPairingClient {
	pub fn new(provider: Rc<MockProvider>) -> Rc<Self> {
		Rc::new(Self {
			provider,
			failures: RefCell::new(VecDeque::new()),
			init_calls: RefCell::new(Vec::new()),
		})
	}

	/// Fails the next `init` call with `error`.
	pub fn fail_next_init(&self, error: ProviderRpcError) {
		self.failures.borrow_mut().push_back(error);
	}

	/// Options passed to every `init` call so far.
	pub fn init_calls(&self) -> Vec<PairingOptions> {
		self.init_calls.borrow().clone()
	}
}

#[async_trait(?Send)]
impl PairingClient for MockPairingClient {
	async fn init(&self, options: &PairingOptions) -> RpcResult<ProviderRef> {
		self.init_calls.borrow_mut().push(options.clone());
		if let Some(err) = self.failures.borrow_mut().pop_front() {
			return Err(err);
		}
		Ok(Rc::clone(&self.provider) as ProviderRef)
	}
}
