//! The single choke point for spec.md §7's fatal error class.
//!
//! At-least-once delivery already tolerates duplicate delivery on restart,
//! so the only safe response to an unknown store error is to tear the
//! process down and let a supervisor restart it with a clean `unacked`
//! list — which the external cleaner then recovers. Every store call in
//! this crate that isn't an "expected empty" read routes its `Err` through
//! [`abort`].

use crate::error::StoreError;

/// Logs `context` and `err`, then aborts the process.
///
/// Never returns. Callers typically write `.unwrap_or_else(|e| fatal::abort(\"...\", e))`
/// on a [`crate::error::StoreError`] result, or match on it directly when the
/// `Ok` arm needs further handling (e.g. the "empty" outcome).
#[cold]
pub(crate) fn abort(context: &str, err: StoreError) -> ! {
    tracing::error!(error = %err, context, "fatal store error, aborting process");
    std::process::exit(1)
}

/// Unwraps a store result, aborting the process on a fatal error.
///
/// Use for operations with no "empty" outcome to reason about (e.g.
/// `appendLeft`, `setAdd`, `length`) where any `Err` is unexpected.
pub(crate) fn expect<T>(context: &str, result: Result<T, StoreError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => abort(context, err),
    }
}
