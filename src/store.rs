//! The store contract: atomic list/set primitives over a Redis-compatible
//! backend, with the three-outcome model from spec.md §4.2 (ok / empty /
//! fatal) expressed as `Result<Option<T>, StoreError>` for the operations
//! that can observe "no such element", and `Result<T, StoreError>` for the
//! ones that can't.

use crate::error::StoreError;
use std::future::Future;
use std::pin::Pin;

/// Atomic list/set operations the core needs against the backing store.
///
/// Uses native `async fn` in a trait (no `async-trait` macro), the same
/// style `span_collector::SpanExporter` uses. Because that style isn't
/// object-safe, [`StoreBoxed`] provides the erased form that the rest of
/// the crate actually stores behind `Arc<dyn StoreBoxed>`.
pub trait Store: Send + Sync {
    /// Atomic multi-element prepend (`LPUSH`).
    fn append_left(
        &self,
        list: &str,
        payloads: Vec<Vec<u8>>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomic move of one element from the tail of `src` to the head of
    /// `dst` (`RPOPLPUSH`). Returns `Ok(None)` if `src` was empty.
    fn pop_right_push_left(
        &self,
        src: &str,
        dst: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Atomic pop of one element from the tail of `list` with no
    /// destination (`RPOP`). Used only by `Delivery::ack`, which has
    /// nowhere to move the payload to. Returns `Ok(None)` if `list` was
    /// empty.
    fn pop_right(
        &self,
        list: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Number of elements in `list` (`LLEN`).
    fn length(&self, list: &str) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Deletes `key`. Returns whether anything was actually removed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Adds `member` to set `set` (`SADD`).
    fn set_add(
        &self,
        set: &str,
        member: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes `member` from set `set` (`SREM`).
    fn set_remove(
        &self,
        set: &str,
        member: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns all members of set `set` (`SMEMBERS`).
    fn set_members(&self, set: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Object-safe counterpart of [`Store`], analogous to
/// `span_collector::SpanExporterBoxed`.
///
/// `Queue`, `Delivery`, and `ConsumerScheduler` hold `Arc<dyn StoreBoxed>`
/// so they aren't generic over the concrete store implementation.
pub trait StoreBoxed: Send + Sync {
    fn append_left_boxed(&self, list: String, payloads: Vec<Vec<u8>>) -> BoxFut<'_, ()>;
    fn pop_right_push_left_boxed(&self, src: String, dst: String) -> BoxFut<'_, Option<Vec<u8>>>;
    fn pop_right_boxed(&self, list: String) -> BoxFut<'_, Option<Vec<u8>>>;
    fn length_boxed(&self, list: String) -> BoxFut<'_, u64>;
    fn delete_boxed(&self, key: String) -> BoxFut<'_, bool>;
    fn set_add_boxed(&self, set: String, member: String) -> BoxFut<'_, ()>;
    fn set_remove_boxed(&self, set: String, member: String) -> BoxFut<'_, ()>;
    fn set_members_boxed(&self, set: String) -> BoxFut<'_, Vec<String>>;
}

impl<T: Store> StoreBoxed for T {
    fn append_left_boxed(&self, list: String, payloads: Vec<Vec<u8>>) -> BoxFut<'_, ()> {
        Box::pin(async move { self.append_left(&list, payloads).await })
    }

    fn pop_right_push_left_boxed(&self, src: String, dst: String) -> BoxFut<'_, Option<Vec<u8>>> {
        Box::pin(async move { self.pop_right_push_left(&src, &dst).await })
    }

    fn pop_right_boxed(&self, list: String) -> BoxFut<'_, Option<Vec<u8>>> {
        Box::pin(async move { self.pop_right(&list).await })
    }

    fn length_boxed(&self, list: String) -> BoxFut<'_, u64> {
        Box::pin(async move { self.length(&list).await })
    }

    fn delete_boxed(&self, key: String) -> BoxFut<'_, bool> {
        Box::pin(async move { self.delete(&key).await })
    }

    fn set_add_boxed(&self, set: String, member: String) -> BoxFut<'_, ()> {
        Box::pin(async move { self.set_add(&set, &member).await })
    }

    fn set_remove_boxed(&self, set: String, member: String) -> BoxFut<'_, ()> {
        Box::pin(async move { self.set_remove(&set, &member).await })
    }

    fn set_members_boxed(&self, set: String) -> BoxFut<'_, Vec<String>> {
        Box::pin(async move { self.set_members(&set).await })
    }
}
