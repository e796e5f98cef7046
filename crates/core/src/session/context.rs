use std::future::Future;

use super::manager::SessionHandle;
use crate::error::{Result, WalletError};

tokio::task_local! {
	static CURRENT: SessionHandle;
}

/// Scoped access to the active [`SessionHandle`].
///
/// Views running inside [`scope`](Self::scope) reach the session without
/// threading the handle through every call. Reading it anywhere else is a
/// programming error and fails with [`WalletError::ContextMisuse`].
pub struct SessionContext;

impl SessionContext {
	/// Runs `future` with `handle` installed as the current session.
	pub async fn scope<F: Future>(handle: SessionHandle, future: F) -> F::Output {
		CURRENT.scope(handle, future).await
	}

	/// Synchronous variant of [`scope`](Self::scope).
	pub fn scope_sync<R>(handle: SessionHandle, f: impl FnOnce() -> R) -> R {
		CURRENT.sync_scope(handle, f)
	}

	/// Returns the installed handle.
	///
	/// # Errors
	///
	/// [`WalletError::ContextMisuse`] outside of a scope.
	pub fn current() -> Result<SessionHandle> {
		Self::try_current().ok_or(WalletError::ContextMisuse)
	}

	pub fn try_current() -> Option<SessionHandle> {
		CURRENT.try_with(SessionHandle::clone).ok()
	}
}
