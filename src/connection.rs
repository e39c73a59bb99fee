//! A name-scoped `Queue` factory.
//!
//! The connection heartbeat and registry (`rmq::connections`,
//! `rmq::connection::<C>::queues`, `rmq::connection::<C>::heartbeat`) are
//! out of scope per spec.md §1/§6 — they belong to an external collaborator.
//! `Connection` deliberately does no I/O of its own: it only remembers a
//! name and hands out `Queue` values bound to that name.

use crate::queue::Queue;
use crate::store::StoreBoxed;
use crate::util;
use std::sync::Arc;

/// A named handle used to scope queues to one consumer process.
///
/// Cloning is cheap: the store handle is an `Arc` and the name is
/// reference-counted.
#[derive(Clone)]
pub struct Connection {
    store: Arc<dyn StoreBoxed>,
    name: Arc<str>,
}

impl Connection {
    /// Builds a connection with an explicit name.
    pub fn new(store: Arc<dyn StoreBoxed>, name: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    /// Builds a connection with a generated `<prefix>-<random-6-char-token>`
    /// name, the same scheme spec.md §4.5 uses for consumer tags.
    pub fn generate_name(store: Arc<dyn StoreBoxed>, prefix: &str) -> Self {
        let name = format!("{prefix}-{}", util::random_token(6));
        Self::new(store, name)
    }

    /// This connection's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens (or re-opens) a queue bound to this connection. Purely
    /// syntactic — no I/O happens until the returned [`Queue`] is used.
    pub fn open_queue(&self, queue_name: impl Into<String>) -> Queue {
        Queue::new(
            Arc::clone(&self.store),
            queue_name.into(),
            self.name.to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    #[test]
    fn generated_names_carry_the_requested_prefix() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let conn = Connection::generate_name(store, "worker");
        assert!(conn.name().starts_with("worker-"));
    }

    #[tokio::test]
    async fn open_queue_does_no_io() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let conn = Connection::new(Arc::clone(&store), "conn-1");
        let queue = conn.open_queue("emails");
        assert_eq!(queue.name(), "emails");
    }
}
