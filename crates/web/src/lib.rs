//! Browser bridge for the presale wallet session.
//!
//! Adapts what the page provides to the `wallet` crate's host traits:
//!
//! - [`JsProvider`]: an injected (or paired) provider object
//! - [`WindowHost`]: `window.ethereum` and its `providers` array
//! - [`JsPairingClient`]: the pairing SDK's `init(options)` function
//! - [`BrowserTimer`]: `setTimeout`
//!
//! [`WalletApp`] is the JS-facing entry point.

mod app;
mod host;
mod js;
pub mod logging;
mod pairing;
mod provider;
mod timer;

pub use app::WalletApp;
pub use host::WindowHost;
pub use pairing::JsPairingClient;
pub use provider::JsProvider;
pub use timer::BrowserTimer;
