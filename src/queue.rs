//! Public façade composing the per-queue components.

use crate::config::ConsumeConfig;
use crate::delivery::Delivery;
use crate::fatal;
use crate::keys::KeyLayout;
use crate::publisher_buffer::PublisherBuffer;
use crate::scheduler::ConsumerScheduler;
use crate::store::StoreBoxed;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One named queue bound to one connection.
///
/// Owns its [`PublisherBuffer`] and [`ConsumerScheduler`] by value — both
/// already hold the `Arc<dyn StoreBoxed>` they need, so there's no extra
/// indirection here, matching spec.md §3's note that ownership of those two
/// components belongs to the queue itself.
pub struct Queue {
    store: Arc<dyn StoreBoxed>,
    name: String,
    queues_key: String,
    ready_key: String,
    rejected_key: String,
    unacked_key: String,
    push_key: Arc<RwLock<Option<String>>>,
    buffer: PublisherBuffer,
    scheduler: ConsumerScheduler,
}

impl Queue {
    pub(crate) fn new(store: Arc<dyn StoreBoxed>, name: String, connection_name: String) -> Self {
        let ready_key = KeyLayout::ready(&name);
        let push_key = Arc::new(RwLock::new(None));
        let scheduler = ConsumerScheduler::new(
            Arc::clone(&store),
            name.clone(),
            connection_name.clone(),
            Arc::clone(&push_key),
        );
        Self {
            queues_key: KeyLayout::queues(),
            rejected_key: KeyLayout::rejected(&name),
            unacked_key: KeyLayout::unacked(&connection_name, &name),
            buffer: PublisherBuffer::new(Arc::clone(&store), ready_key.clone()),
            ready_key,
            push_key,
            scheduler,
            store,
            name,
        }
    }

    /// The queue's name, as given to [`crate::Connection::open_queue`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Publish(string)`. Byte-identical to `publish_bytes(payload.into_bytes())`.
    pub async fn publish(&self, payload: impl Into<String>) -> bool {
        self.publish_bytes(payload.into().into_bytes()).await
    }

    /// `PublishBytes(bytes)`.
    pub async fn publish_bytes(&self, payload: Vec<u8>) -> bool {
        self.buffer.publish(payload).await
    }

    /// `SetPublishBufferSize(size, pollInterval)`. `size == 0` disables
    /// buffering.
    pub async fn set_publish_buffer_size(&self, size: usize, poll_interval: Duration) {
        self.buffer.set_size(size, poll_interval).await;
    }

    /// `SetPushQueue(other)`. Only meaningful when `other` shares this
    /// queue's store — nothing here checks that, same as spec.md §4.6.
    pub fn set_push_queue(&self, other: &Queue) {
        *self.push_key.write().unwrap() = Some(other.ready_key.clone());
    }

    /// `StartConsuming(prefetchLimit, pollInterval)`.
    pub async fn start_consuming(&self, prefetch_limit: usize, poll_interval: Duration) -> bool {
        self.scheduler
            .start_consuming(prefetch_limit, poll_interval)
            .await
    }

    /// `StartConsuming` using a prepared [`ConsumeConfig`].
    pub async fn start_consuming_with(&self, config: ConsumeConfig) -> bool {
        self.start_consuming(config.prefetch_limit, config.poll_interval)
            .await
    }

    /// `StopConsuming`.
    pub async fn stop_consuming(&self) -> bool {
        self.scheduler.stop_consuming().await
    }

    /// `AddConsumer(tag, callback)`.
    ///
    /// # Panics
    ///
    /// Panics if the queue is not currently consuming, per spec.md §8.
    pub async fn add_consumer<F, Fut>(&self, tag: &str, callback: F) -> String
    where
        F: Fn(Delivery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.scheduler.add_consumer(tag, callback).await
    }

    /// `AddBatchConsumer(tag, size, callback)`.
    ///
    /// # Panics
    ///
    /// Panics if the queue is not currently consuming.
    pub async fn add_batch_consumer<F, Fut>(&self, tag: &str, batch_size: usize, callback: F) -> String
    where
        F: Fn(Vec<Delivery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.scheduler
            .add_batch_consumer(tag, batch_size, callback)
            .await
    }

    /// `PurgeReady`. Returns whether anything was removed.
    pub async fn purge_ready(&self) -> bool {
        fatal::expect(
            "purge ready",
            self.store.delete_boxed(self.ready_key.clone()).await,
        )
    }

    /// `PurgeRejected`. Returns whether anything was removed.
    pub async fn purge_rejected(&self) -> bool {
        fatal::expect(
            "purge rejected",
            self.store.delete_boxed(self.rejected_key.clone()).await,
        )
    }

    /// `ReturnAllUnacked`. Moves tail-of-unacked to head-of-ready, up to the
    /// length observed at entry, stopping early once unacked reports empty.
    /// Returns the count actually moved.
    pub async fn return_all_unacked(&self) -> u64 {
        let limit = fatal::expect(
            "read unacked length",
            self.store.length_boxed(self.unacked_key.clone()).await,
        );
        self.move_batch(&self.unacked_key, &self.ready_key, limit)
            .await
    }

    /// `ReturnRejected(n)`. Moves up to `n` entries from rejected to ready.
    pub async fn return_rejected(&self, n: u64) -> u64 {
        self.move_batch(&self.rejected_key, &self.ready_key, n).await
    }

    /// `ReturnAllRejected`.
    pub async fn return_all_rejected(&self) -> u64 {
        let limit = fatal::expect(
            "read rejected length",
            self.store.length_boxed(self.rejected_key.clone()).await,
        );
        self.return_rejected(limit).await
    }

    /// `Close`. Purges ready and rejected, then removes this queue's name
    /// from the `queues` set. Does **not** stop consuming — closing a queue
    /// that's still consuming is a caller error, per spec.md §4.6.
    pub async fn close(&self) -> bool {
        self.purge_ready().await;
        self.purge_rejected().await;
        fatal::expect(
            "remove queue from queues set",
            self.store
                .set_remove_boxed(self.queues_key.clone(), self.name.clone())
                .await,
        );
        true
    }

    async fn move_batch(&self, src: &str, dst: &str, max: u64) -> u64 {
        let mut moved = 0;
        for _ in 0..max {
            match self
                .store
                .pop_right_push_left_boxed(src.to_string(), dst.to_string())
                .await
            {
                Ok(Some(_)) => moved += 1,
                Ok(None) => break,
                Err(e) => fatal::abort("return-unacked/rejected move", e),
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::store::Store;

    fn queue(store: Arc<dyn StoreBoxed>) -> Queue {
        Queue::new(store, "q".to_string(), "conn-1".to_string())
    }

    #[tokio::test]
    async fn publish_without_buffer_goes_straight_to_ready() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let q = queue(Arc::clone(&store));

        assert!(q.publish("a").await);
        assert_eq!(store.length("rmq::queue::[q]::ready").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn purge_ready_reports_whether_anything_was_removed() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let q = queue(Arc::clone(&store));

        assert!(!q.purge_ready().await);
        q.publish("a").await;
        assert!(q.purge_ready().await);
        assert_eq!(store.length("rmq::queue::[q]::ready").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn return_all_rejected_moves_everything_back_to_ready() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let q = queue(Arc::clone(&store));
        store
            .append_left("rmq::queue::[q]::rejected", vec![b"a".to_vec(), b"b".to_vec()])
            .await
            .unwrap();

        let moved = q.return_all_rejected().await;
        assert_eq!(moved, 2);
        assert_eq!(store.length("rmq::queue::[q]::ready").await.unwrap(), 2);
        assert_eq!(store.length("rmq::queue::[q]::rejected").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn return_all_unacked_stops_at_the_length_observed_at_entry() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let q = queue(Arc::clone(&store));
        store
            .append_left(
                "rmq::connection::conn-1::queue::[q]::unacked",
                vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()],
            )
            .await
            .unwrap();

        let moved = q.return_all_unacked().await;
        assert_eq!(moved, 3);
        assert_eq!(store.length("rmq::queue::[q]::ready").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn close_purges_and_removes_from_queues_set() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let q = queue(Arc::clone(&store));
        store.set_add("rmq::queues", "q").await.unwrap();
        q.publish("a").await;

        assert!(q.close().await);
        assert_eq!(store.length("rmq::queue::[q]::ready").await.unwrap(), 0);
        assert!(!store.set_members("rmq::queues").await.unwrap().contains(&"q".to_string()));
    }

    #[tokio::test]
    async fn set_push_queue_routes_pushes_to_the_other_queues_ready_list() {
        let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
        let a = queue(Arc::clone(&store));
        let b = Queue::new(Arc::clone(&store), "b".to_string(), "conn-1".to_string());
        a.set_push_queue(&b);

        store
            .append_left(
                "rmq::connection::conn-1::queue::[q]::unacked",
                vec![b"z".to_vec()],
            )
            .await
            .unwrap();

        let delivery = Delivery::new(
            b"z".to_vec(),
            Arc::clone(&store),
            "rmq::connection::conn-1::queue::[q]::unacked".to_string(),
            "rmq::queue::[q]::rejected".to_string(),
            Arc::clone(&a.push_key),
        );
        delivery.push().await.unwrap();

        assert_eq!(store.length("rmq::queue::[b]::ready").await.unwrap(), 1);
    }
}
