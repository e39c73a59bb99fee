//! Deterministic derivation of store keys from queue and connection names.
//!
//! Purely syntactic: no I/O, no validation beyond substitution into the
//! fixed templates. The templates themselves are an external contract (the
//! out-of-scope connection-heartbeat/cleaner collaborators depend on the
//! exact strings) and must never be rewritten cosmetically.

/// Zero-sized type exposing the key templates as associated functions.
pub struct KeyLayout;

impl KeyLayout {
    /// `rmq::queues` — set of names of currently-open queues.
    pub fn queues() -> String {
        "rmq::queues".to_string()
    }

    /// `rmq::queue::[<Q>]::ready` — payloads awaiting delivery.
    pub fn ready(queue: &str) -> String {
        format!("rmq::queue::[{queue}]::ready")
    }

    /// `rmq::queue::[<Q>]::rejected` — payloads rejected by consumers.
    pub fn rejected(queue: &str) -> String {
        format!("rmq::queue::[{queue}]::rejected")
    }

    /// `rmq::connections` — out of scope for this crate; published here only
    /// because the external connection registry depends on the exact
    /// literal string.
    pub fn connections() -> String {
        "rmq::connections".to_string()
    }

    /// `rmq::connection::<C>::heartbeat` — out of scope; see
    /// [`KeyLayout::connections`].
    pub fn heartbeat(connection: &str) -> String {
        format!("rmq::connection::{connection}::heartbeat")
    }

    /// `rmq::connection::<C>::queues` — out of scope; see
    /// [`KeyLayout::connections`].
    pub fn connection_queues(connection: &str) -> String {
        format!("rmq::connection::{connection}::queues")
    }

    /// `rmq::connection::<C>::queue::[<Q>]::consumers` — consumer tags
    /// active on this (connection, queue) pair.
    pub fn consumers(connection: &str, queue: &str) -> String {
        format!("rmq::connection::{connection}::queue::[{queue}]::consumers")
    }

    /// `rmq::connection::<C>::queue::[<Q>]::unacked` — payloads currently
    /// held by this consumer process.
    pub fn unacked(connection: &str, queue: &str) -> String {
        format!("rmq::connection::{connection}::queue::[{queue}]::unacked")
    }
}
