//! Wire types for the injected wallet provider surface.
//!
//! This crate contains the serde-serializable shapes exchanged with an
//! EIP-1193 provider: request arguments, RPC error payloads, emitted events,
//! self-reported capability flags, and chain registration parameters.
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization, deserialization and parsing
//! - **1:1 with the provider API**: Field names match what wallets put on the wire
//!
//! Session handling and provider discovery live in `presale-wallet`.

pub mod chain;
pub mod error;
pub mod event;
pub mod flags;
pub mod request;

pub use chain::*;
pub use error::*;
pub use event::*;
pub use flags::*;
pub use request::*;
