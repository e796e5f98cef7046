//! The remote pairing SDK's provider initializer.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Function, Promise};
use tracing::debug;
use wallet::{PairingClient, PairingOptions, ProviderRef};
use wallet_protocol::ProviderRpcError;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::js::{rpc_error, to_js};
use crate::provider::JsProvider;

/// Wraps a page-supplied `init(options) => Promise<provider>` function.
pub struct JsPairingClient {
	init: Function,
}

impl JsPairingClient {
	pub fn new(init: Function) -> Self {
		Self { init }
	}
}

#[async_trait(?Send)]
impl PairingClient for JsPairingClient {
	async fn init(&self, options: &PairingOptions) -> Result<ProviderRef, ProviderRpcError> {
		let js_options = to_js(options).map_err(rpc_error)?;
		debug!(target = "wallet.web", chains = ?options.chains, "calling pairing init");
		let returned = self.init.call1(&JsValue::NULL, &js_options).map_err(rpc_error)?;
		let provider = JsFuture::from(Promise::resolve(&returned)).await.map_err(rpc_error)?;
		if !provider.is_object() {
			return Err(ProviderRpcError::without_code("pairing init returned no provider"));
		}
		Ok(Rc::new(JsProvider::new(provider)) as ProviderRef)
	}
}
