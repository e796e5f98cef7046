//! The connection session.
//!
//! One [`SessionDriver`] task owns the [`SessionState`]. Two producers feed it
//! through a single ordered channel:
//!
//! - [`SessionHandle`] operations (connect, disconnect, network switch)
//! - Provider events forwarded by the listener registered at connect time
//!
//! Each message runs to completion before the next is read, so overlapping
//! operations queue up in call order and events are applied between them.
//! Every listener is tagged with the session generation it was registered
//! under; events from a replaced or reset provider are dropped.
//!
//! State changes are published on a `watch` channel and discrete outcomes
//! ([`SessionNotice`]) on a `broadcast` channel.

mod context;
mod manager;
mod notice;
mod state;

pub use context::SessionContext;
pub use manager::{SessionDriver, SessionHandle, SessionManager};
pub use notice::SessionNotice;
pub use state::{SessionPhase, SessionState, SessionSummary};
