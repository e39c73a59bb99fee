//! rmq - a durable work-queue layered over a Redis-compatible store.
//!
//! Producers publish opaque byte payloads into named queues; one or more
//! consumer processes pull those payloads, process them, and either
//! acknowledge, reject, or forward (push) each delivery. At-least-once
//! delivery and crash recovery come from the backing store's list
//! primitives: every state transition (ready -> unacked, unacked ->
//! rejected/push-target) is a single atomic move, never a synthesized
//! multi-step transaction.
//!
//! # Example
//!
//! ```no_run
//! use rmq::{Connection, RedisStore, StoreBoxed, StoreConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), rmq::StoreError> {
//! let store: Arc<dyn StoreBoxed> = Arc::new(RedisStore::connect(StoreConfig::default()).await?);
//! let conn = Connection::generate_name(store, "worker");
//! let queue = conn.open_queue("emails");
//!
//! queue.publish("hello").await;
//!
//! queue.start_consuming(10, std::time::Duration::from_millis(100)).await;
//! queue.add_consumer("sender", |delivery| async move {
//!     println!("{:?}", delivery.payload());
//!     let _ = delivery.ack().await;
//! }).await;
//! # Ok(())
//! # }
//! ```
//!
//! This crate implements only the core delivery pipeline, the consumer
//! scheduler, the publisher buffer, and the ack/reject/push protocol. The
//! connection heartbeat, the dead-connection cleaner, and any
//! statistics/introspection surface are deliberately out of scope; they are
//! external collaborators that depend only on the key layout in
//! [`KeyLayout`].

mod config;
mod connection;
mod delivery;
mod error;
mod fatal;
mod keys;
mod memory_store;
mod publisher_buffer;
mod queue;
mod redis_store;
mod scheduler;
mod store;
mod util;

pub use config::{ConsumeConfig, StoreConfig};
pub use connection::Connection;
pub use delivery::Delivery;
pub use error::{QueueError, StoreError};
pub use keys::KeyLayout;
pub use memory_store::MemoryStore;
pub use queue::Queue;
pub use redis_store::RedisStore;
pub use store::{Store, StoreBoxed};
