//! A single in-flight payload bound to its originating queue.

use crate::error::QueueError;
use crate::fatal;
use crate::store::StoreBoxed;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// One in-flight payload, plus the store keys needed to complete it.
///
/// A `Delivery` is created when a payload is atomically moved from a
/// queue's `ready` list to a connection's `unacked` list, and is logically
/// destroyed when `ack`, `reject`, or `push` is called — each exactly once,
/// per spec.md §4.3. A delivery that is never acted on stays in `unacked`
/// indefinitely; that's intentional, not a leak — the external cleaner
/// recovers it.
///
/// `Delivery` does not hold a back-pointer to the `Queue` it came from; it
/// carries only the keys it needs.
pub struct Delivery {
    payload: Vec<u8>,
    store: Arc<dyn StoreBoxed>,
    unacked_key: String,
    rejected_key: String,
    push_key: Arc<RwLock<Option<String>>>,
    completed: AtomicBool,
}

impl Delivery {
    pub(crate) fn new(
        payload: Vec<u8>,
        store: Arc<dyn StoreBoxed>,
        unacked_key: String,
        rejected_key: String,
        push_key: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            payload,
            store,
            unacked_key,
            rejected_key,
            push_key,
            completed: AtomicBool::new(false),
        }
    }

    /// The opaque payload bytes. The library never encodes, compresses, or
    /// validates this.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Removes this delivery from `unacked`. The only operation that
    /// reduces a queue's total delivery count.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AlreadyCompleted`] if `ack`/`reject`/`push` was
    /// already called on this delivery, or [`QueueError::NothingToAck`] if
    /// the unacked list was already empty (e.g. the external cleaner beat
    /// us to it).
    pub async fn ack(&self) -> Result<(), QueueError> {
        self.claim()?;
        match self.store.pop_right_boxed(self.unacked_key.clone()).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(QueueError::NothingToAck),
            Err(e) => fatal::abort("delivery ack", e),
        }
    }

    /// Atomically moves this delivery from `unacked` to the head of
    /// `rejected`.
    ///
    /// # Errors
    ///
    /// See [`Delivery::ack`].
    pub async fn reject(&self) -> Result<(), QueueError> {
        self.claim()?;
        match self
            .store
            .pop_right_push_left_boxed(self.unacked_key.clone(), self.rejected_key.clone())
            .await
        {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(QueueError::NothingToReject),
            Err(e) => fatal::abort("delivery reject", e),
        }
    }

    /// Atomically moves this delivery from `unacked` to the head of the
    /// configured push-target's `ready` list. If no push target is
    /// configured, behaves exactly like [`Delivery::reject`].
    ///
    /// # Errors
    ///
    /// See [`Delivery::ack`].
    pub async fn push(&self) -> Result<(), QueueError> {
        let target = self.push_key.read().unwrap().clone();
        let Some(push_list) = target else {
            return self.reject().await;
        };

        self.claim()?;
        match self
            .store
            .pop_right_push_left_boxed(self.unacked_key.clone(), push_list)
            .await
        {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(QueueError::NothingToPush),
            Err(e) => fatal::abort("delivery push", e),
        }
    }

    /// Marks the delivery as acted-on, failing if it already was.
    fn claim(&self) -> Result<(), QueueError> {
        if self.completed.swap(true, Ordering::AcqRel) {
            Err(QueueError::AlreadyCompleted)
        } else {
            Ok(())
        }
    }
}
