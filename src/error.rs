use thiserror::Error;

/// Fatal store errors: anything the [`crate::Store`] contract doesn't
/// recognize as a normal "no such element" outcome.
///
/// Every other error class in the system (`spec.md` §7 classes 1 and 2) is
/// represented either as `Ok(None)` (the "empty" outcome) or as a plain
/// return value (`bool`, a count, [`QueueError`]). `StoreError` exists only
/// for the third class: errors that leave the caller unable to reason about
/// store state, which the core responds to by aborting the process (see
/// [`crate::fatal`]).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying Redis client reported an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The connection pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<redis::RedisError>),
}

/// Local-result and caller-misuse errors surfaced directly to callers of
/// [`crate::Delivery`] and [`crate::Queue`].
///
/// These are never fatal: they report outcomes a well-behaved caller can
/// observe and act on (spec.md §7 class 2), as opposed to [`StoreError`]
/// which the core never returns to a caller — it aborts instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `ack`, `reject`, or `push` was called more than once on the same
    /// delivery.
    #[error("delivery was already acked, rejected, or pushed")]
    AlreadyCompleted,

    /// `ack` found nothing at the tail of `unacked` — another actor (most
    /// likely the external cleaner) already moved this delivery's slot.
    #[error("nothing to ack: unacked list was already empty")]
    NothingToAck,

    /// `reject` found nothing at the tail of `unacked`.
    #[error("nothing to reject: unacked list was already empty")]
    NothingToReject,

    /// `push` found nothing at the tail of `unacked`.
    #[error("nothing to push: unacked list was already empty")]
    NothingToPush,
}
