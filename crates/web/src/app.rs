//! The page-facing API.

use std::rc::Rc;

use js_sys::{Function, Object, Promise, Reflect};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use wallet::{DetectionService, SessionHandle, SessionManager, SessionNotice, WalletConfig, WalletEnvironment};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::host::WindowHost;
use crate::js::{to_js, wallet_error};
use crate::logging::init_logging;
use crate::pairing::JsPairingClient;
use crate::timer::BrowserTimer;

/// `Number.MAX_SAFE_INTEGER`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Wallet detection and the connection session, exported to JS.
///
/// ```js
/// const app = new WalletApp(EthereumProvider.init, projectId, 1);
/// app.onChange((state) => render(state));
/// await app.connect("metamask");
/// ```
#[wasm_bindgen]
pub struct WalletApp {
	handle: SessionHandle,
	detection: Rc<DetectionService>,
}

#[wasm_bindgen]
impl WalletApp {
	/// `init` is the pairing SDK's provider initializer; without it the
	/// remote pairing entry fails to connect.
	#[wasm_bindgen(constructor)]
	pub fn new(init: Option<Function>, project_id: Option<String>, verbosity: Option<u8>) -> WalletApp {
		console_error_panic_hook::set_once();
		init_logging(verbosity.unwrap_or(1));

		let mut config = WalletConfig::default();
		if let Some(project_id) = project_id.filter(|id| !id.trim().is_empty()) {
			config = config.with_project_id(project_id);
		}
		if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
			config = config.with_origin(&origin);
		}

		let mut env = WalletEnvironment::new(Rc::new(WindowHost)).with_timer(Rc::new(BrowserTimer));
		if let Some(init) = init {
			env = env.with_pairing(Rc::new(JsPairingClient::new(init)));
		}

		let (handle, driver) = SessionManager::new(env.clone(), config.clone());
		spawn_local(driver.run());
		info!(target = "wallet.web", pairing = env.pairing().is_some(), "wallet app started");

		if env.pairing().is_some() {
			let handle = handle.clone();
			spawn_local(async move {
				match handle.restore().await {
					Ok(restored) => debug!(target = "wallet.web", restored, "pairing session restore finished"),
					Err(err) => warn!(target = "wallet.web", error = %err, "pairing session restore failed"),
				}
			});
		}

		WalletApp {
			handle,
			detection: Rc::new(DetectionService::new(env, &config)),
		}
	}

	/// Current availability list.
	pub fn detect(&self) -> Result<JsValue, JsValue> {
		to_js(&self.detection.detect())
	}

	/// Re-detects after the settle delay.
	pub fn refresh(&self) -> Promise {
		let detection = Rc::clone(&self.detection);
		future_to_promise(async move { to_js(&detection.refresh().await) })
	}

	#[wasm_bindgen(js_name = isDetecting)]
	pub fn is_detecting(&self) -> bool {
		self.detection.is_detecting()
	}

	/// Diagnostics snapshot of the injected providers.
	pub fn environment(&self) -> Result<JsValue, JsValue> {
		to_js(&self.detection.environment_report())
	}

	pub fn connect(&self, wallet_id: String) -> Promise {
		let handle = self.handle.clone();
		future_to_promise(async move {
			handle.connect(&wallet_id).await.map_err(|e| wallet_error(&e))?;
			Ok(JsValue::UNDEFINED)
		})
	}

	#[wasm_bindgen(js_name = connectWallet)]
	pub fn connect_wallet(&self) {
		self.handle.connect_wallet();
	}

	pub fn disconnect(&self) -> Promise {
		let handle = self.handle.clone();
		future_to_promise(async move {
			handle.disconnect().await.map_err(|e| wallet_error(&e))?;
			Ok(JsValue::UNDEFINED)
		})
	}

	/// `chainId` is a positive integer number (up to 2^53 - 1) or a bigint.
	#[wasm_bindgen(js_name = switchNetwork)]
	pub fn switch_network(&self, chain_id: JsValue) -> Promise {
		let handle = self.handle.clone();
		future_to_promise(async move {
			let chain_id = chain_id_from_js(&chain_id)?;
			handle.switch_network(chain_id).await.map_err(|e| wallet_error(&e))?;
			Ok(JsValue::UNDEFINED)
		})
	}

	/// Resolves to the hex wei balance, or `null`.
	#[wasm_bindgen(js_name = getBalance)]
	pub fn get_balance(&self, address: String) -> Promise {
		let handle = self.handle.clone();
		future_to_promise(async move {
			Ok(handle
				.get_balance(&address)
				.await
				.map_or(JsValue::NULL, |balance| JsValue::from_str(&balance)))
		})
	}

	pub fn state(&self) -> Result<JsValue, JsValue> {
		to_js(&self.handle.state().summary())
	}

	/// Calls `callback(state)` after every state change.
	#[wasm_bindgen(js_name = onChange)]
	pub fn on_change(&self, callback: Function) {
		let mut rx = self.handle.subscribe();
		spawn_local(async move {
			while rx.changed().await.is_ok() {
				let summary = rx.borrow_and_update().summary();
				if let Ok(state) = to_js(&summary) {
					let _ = callback.call1(&JsValue::NULL, &state);
				}
			}
			debug!(target = "wallet.web", "state listener closed");
		});
	}

	/// Calls `callback({ message, error })` for every session notice.
	#[wasm_bindgen(js_name = onNotice)]
	pub fn on_notice(&self, callback: Function) {
		let mut rx = self.handle.notices();
		spawn_local(async move {
			loop {
				match rx.recv().await {
					Ok(notice) => {
						let _ = callback.call1(&JsValue::NULL, &notice_object(&notice));
					}
					Err(RecvError::Lagged(skipped)) => debug!(target = "wallet.web", skipped, "notice listener lagged"),
					Err(RecvError::Closed) => break,
				}
			}
		});
	}
}

fn chain_id_from_js(value: &JsValue) -> Result<u64, JsValue> {
	let chain_id = if value.is_bigint() {
		u64::try_from(value.clone()).ok().filter(|id| *id > 0)
	} else {
		value.as_f64().and_then(chain_id_from_number)
	};
	chain_id.ok_or_else(|| js_sys::TypeError::new("chainId must be a positive integer").into())
}

/// Accepts whole, positive, exactly representable numbers.
fn chain_id_from_number(n: f64) -> Option<u64> {
	(n.fract() == 0.0 && n >= 1.0 && n <= MAX_SAFE_INTEGER).then_some(n as u64)
}

fn notice_object(notice: &SessionNotice) -> JsValue {
	let object = Object::new();
	let _ = Reflect::set(&object, &JsValue::from_str("message"), &JsValue::from_str(&notice.message()));
	let _ = Reflect::set(&object, &JsValue::from_str("error"), &JsValue::from_bool(notice.is_error()));
	object.into()
}
