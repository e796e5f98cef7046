use std::time::Duration;

use async_trait::async_trait;
use js_sys::Promise;
use wallet::Timer;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// [`Timer`] backed by `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
	async fn sleep(&self, duration: Duration) {
		let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
		let promise = Promise::new(&mut |resolve, _reject| {
			let scheduled = web_sys::window()
				.map(|window| window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis).is_ok())
				.unwrap_or(false);
			if !scheduled {
				let _ = resolve.call0(&JsValue::UNDEFINED);
			}
		});
		let _ = JsFuture::from(promise).await;
	}
}
