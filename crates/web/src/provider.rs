//! Injected JS provider objects behind [`Eip1193Provider`].

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Promise};
use serde_json::Value;
use tracing::{debug, warn};
use wallet::handlers::next_listener_id;
use wallet::{EventListener, Eip1193Provider, Subscription};
use wallet_protocol::{CapabilityFlags, EVENT_NAMES, FLAG_NAMES, ProviderEvent, ProviderRpcError, RequestArguments, UNSUPPORTED_METHOD, parse_accounts};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::js::{from_js, property, rpc_error, to_js};

/// A provider object found on the page (or returned by the pairing SDK).
#[derive(Clone)]
pub struct JsProvider {
	inner: JsValue,
}

impl JsProvider {
	pub fn new(inner: JsValue) -> Self {
		Self { inner }
	}

	fn method(&self, name: &str) -> Option<Function> {
		property(&self.inner, name).dyn_into::<Function>().ok()
	}

	/// Calls `name(args...)` on the object and awaits the result if it is thenable.
	async fn invoke(&self, name: &str, args: &[&JsValue]) -> Result<JsValue, ProviderRpcError> {
		let function = self
			.method(name)
			.ok_or_else(|| ProviderRpcError::new(UNSUPPORTED_METHOD, format!("provider has no {name} method")))?;
		let returned = match args {
			[] => function.call0(&self.inner),
			[a] => function.call1(&self.inner, a),
			[a, b, ..] => function.call2(&self.inner, a, b),
		}
		.map_err(rpc_error)?;
		JsFuture::from(Promise::resolve(&returned)).await.map_err(rpc_error)
	}
}

#[async_trait(?Send)]
impl Eip1193Provider for JsProvider {
	fn flags(&self) -> CapabilityFlags {
		let mut flags = CapabilityFlags::default();
		for name in FLAG_NAMES {
			flags.set(name, property(&self.inner, name).is_truthy());
		}
		flags
	}

	async fn request(&self, args: RequestArguments) -> Result<Value, ProviderRpcError> {
		let method = args.method.clone();
		let payload = to_js(&args).map_err(rpc_error)?;
		let result = self.invoke("request", &[&payload]).await?;
		if result.is_undefined() {
			return Ok(Value::Null);
		}
		from_js(result).map_err(|err| {
			warn!(target = "wallet.web", method = %method, "unreadable provider response");
			rpc_error(err)
		})
	}

	fn subscribe(&self, listener: EventListener) -> Subscription {
		let Some(on) = self.method("on") else {
			warn!(target = "wallet.web", "provider does not support event subscription");
			return Subscription::detached();
		};

		let mut registered = Vec::with_capacity(EVENT_NAMES.len());
		for name in EVENT_NAMES {
			let listener = Rc::clone(&listener);
			let callback = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| match decode_event(name, payload) {
				Some(event) => listener(event),
				None => debug!(target = "wallet.web", event = name, "ignoring unreadable event payload"),
			});
			if let Err(err) = on.call2(&self.inner, &JsValue::from_str(name), callback.as_ref()) {
				warn!(target = "wallet.web", event = name, error = %crate::js::stringify(&err), "failed to register listener");
				continue;
			}
			registered.push((name, callback));
		}

		let inner = self.inner.clone();
		Subscription::new(next_listener_id(), move |_| {
			let remove = ["removeListener", "off"]
				.into_iter()
				.find_map(|name| property(&inner, name).dyn_into::<Function>().ok());
			let Some(remove) = remove else {
				// The provider keeps calling these; stale events are dropped by the session.
				debug!(target = "wallet.web", "provider cannot remove listeners; leaking them");
				registered.into_iter().for_each(|(_, callback)| callback.forget());
				return;
			};
			for (name, callback) in &registered {
				let _ = remove.call2(&inner, &JsValue::from_str(name), callback.as_ref());
			}
		})
	}

	fn is_connected(&self) -> bool {
		property(&self.inner, "connected").is_truthy()
	}

	async fn enable(&self) -> Result<Vec<String>, ProviderRpcError> {
		if self.method("enable").is_none() {
			let accounts = self.request(RequestArguments::request_accounts()).await?;
			return Ok(parse_accounts(&accounts));
		}
		let accounts = self.invoke("enable", &[]).await?;
		Ok(from_js::<Value>(accounts).map(|v| parse_accounts(&v)).unwrap_or_default())
	}

	async fn disconnect(&self) -> Result<(), ProviderRpcError> {
		if self.method("disconnect").is_none() {
			return Ok(());
		}
		self.invoke("disconnect", &[]).await.map(|_| ())
	}
}

fn decode_event(name: &str, payload: JsValue) -> Option<ProviderEvent> {
	// Error objects keep `message` non-enumerable, so read them directly.
	if name == "disconnect" {
		let error = (!payload.is_undefined() && !payload.is_null()).then(|| rpc_error(payload));
		return Some(ProviderEvent::Disconnect { error });
	}
	let value: Value = from_js(payload).ok()?;
	ProviderEvent::from_raw(name, &value)
}
