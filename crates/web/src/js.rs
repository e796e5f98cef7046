//! Conversions between JS values and the wire types.

use js_sys::Reflect;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wallet::WalletError;
use wallet_protocol::ProviderRpcError;
use wasm_bindgen::prelude::*;

/// Serializes into plain JS objects (not `Map`s), as providers expect.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
	value
		.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
		.map_err(JsValue::from)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
	serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

/// Reads a property, treating failures as `undefined`.
pub fn property(target: &JsValue, key: &str) -> JsValue {
	Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Converts a thrown or rejected value into a provider error.
///
/// Picks up `code` and `message` from error objects; anything else becomes
/// a code-less error with its string form.
pub fn rpc_error(err: JsValue) -> ProviderRpcError {
	if err.is_object() {
		let message = property(&err, "message").as_string().unwrap_or_else(|| stringify(&err));
		let mut rpc = match property(&err, "code").as_f64() {
			Some(code) => ProviderRpcError::new(code as i64, message),
			None => ProviderRpcError::without_code(message),
		};
		let data = property(&err, "data");
		if !data.is_undefined() {
			rpc.data = from_js(data).ok();
		}
		return rpc;
	}
	ProviderRpcError::without_code(stringify(&err))
}

pub fn stringify(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| js_sys::JSON::stringify(value).ok()?.as_string())
		.unwrap_or_else(|| format!("{value:?}"))
}

/// Rejection value handed back to page code: an `Error` with a `kind` tag.
pub fn wallet_error(err: &WalletError) -> JsValue {
	let error = js_sys::Error::new(&err.to_string());
	let _ = Reflect::set(&error, &JsValue::from_str("kind"), &JsValue::from_str(err.kind()));
	error.into()
}
