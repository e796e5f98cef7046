//! `window.ethereum` as an [`InjectedHost`].

use std::rc::Rc;

use js_sys::Array;
use wallet::{InjectedHost, InjectedProviders, ProviderRef};
use wasm_bindgen::prelude::*;

use crate::js::property;
use crate::provider::JsProvider;

/// Reads the page's injected providers on every call; nothing is cached, so
/// extensions that inject late are picked up by the next detection pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowHost;

impl InjectedHost for WindowHost {
	fn injected(&self) -> InjectedProviders {
		let Some(window) = web_sys::window() else {
			return InjectedProviders::none();
		};
		let ethereum = property(&window, "ethereum");
		if !ethereum.is_object() {
			return InjectedProviders::none();
		}

		let providers = property(&ethereum, "providers");
		let primary: ProviderRef = Rc::new(JsProvider::new(ethereum));
		if !Array::is_array(&providers) {
			return InjectedProviders::single(primary);
		}

		let collection = Array::from(&providers)
			.iter()
			.filter(JsValue::is_object)
			.map(|provider| Rc::new(JsProvider::new(provider)) as ProviderRef)
			.collect();
		InjectedProviders::with_collection(primary, collection)
	}
}
