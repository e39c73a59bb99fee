//! Write-coalescing path that batches publishes into multi-element
//! `appendLeft` calls.

use crate::store::StoreBoxed;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

struct BufferState {
    tx: mpsc::Sender<Vec<u8>>,
    drain: JoinHandle<()>,
    size: usize,
}

/// Optional in-process queue that coalesces many publishes into batched
/// `appendLeft` calls, trading durability-on-crash for throughput.
///
/// `publish` takes the shared (read) side of an `RwLock`; `set_size` takes
/// the exclusive (write) side, per spec.md §4.4 — frequent, concurrent
/// publishes never block each other, only the rare resize does.
pub(crate) struct PublisherBuffer {
    store: Arc<dyn StoreBoxed>,
    ready_key: String,
    state: RwLock<Option<BufferState>>,
}

impl PublisherBuffer {
    pub(crate) fn new(store: Arc<dyn StoreBoxed>, ready_key: String) -> Self {
        Self {
            store,
            ready_key,
            state: RwLock::new(None),
        }
    }

    /// Publishes one payload. If buffering is enabled, enqueues it (blocking
    /// the caller if the buffer is full — the documented backpressure
    /// point) and always reports success. Otherwise performs a direct
    /// `appendLeft` and reports whether it succeeded.
    ///
    /// A fatal store error on the direct path aborts the process per
    /// spec.md §7, so in practice this only ever returns `true` when it
    /// returns at all.
    pub(crate) async fn publish(&self, payload: Vec<u8>) -> bool {
        let tx = {
            let guard = self.state.read().await;
            guard.as_ref().map(|state| state.tx.clone())
        };

        match tx {
            Some(tx) => {
                // Buffer disconnects only once every sender clone (including
                // this one, once dropped below) goes away, i.e. never while
                // we're actively sending - a closed channel here means
                // set_size raced us into a full resize, which we treat as a
                // dropped publish rather than a panic.
                let _ = tx.send(payload).await;
                true
            }
            None => {
                let result = self
                    .store
                    .append_left_boxed(self.ready_key.clone(), vec![payload])
                    .await;
                match result {
                    Ok(()) => true,
                    Err(e) => crate::fatal::abort("publisher direct append", e),
                }
            }
        }
    }

    /// Resizes (or disables, with `size == 0`) the publish buffer.
    ///
    /// Draining the old buffer (closing its input, waiting for the drain
    /// routine to finish) happens before installing a new one; the call
    /// blocks until that drain completes. A request for the currently
    /// configured size is a no-op.
    pub(crate) async fn set_size(&self, size: usize, poll_interval: std::time::Duration) {
        let mut guard = self.state.write().await;

        if let Some(state) = guard.as_ref() {
            if state.size == size {
                return;
            }
        }

        if let Some(old) = guard.take() {
            drop(old.tx);
            let _ = old.drain.await;
        }

        if size == 0 {
            return;
        }

        let (tx, rx) = mpsc::channel(size);
        let drain = tokio::spawn(drain_loop(
            Arc::clone(&self.store),
            self.ready_key.clone(),
            rx,
            poll_interval,
        ));
        *guard = Some(BufferState { tx, drain, size });
    }
}

async fn drain_loop(
    store: Arc<dyn StoreBoxed>,
    ready_key: String,
    mut rx: mpsc::Receiver<Vec<u8>>,
    poll_interval: std::time::Duration,
) {
    let mut batch = Vec::new();
    loop {
        loop {
            match rx.try_recv() {
                Ok(payload) => batch.push(payload),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if !batch.is_empty() {
                        flush(&store, &ready_key, std::mem::take(&mut batch)).await;
                    }
                    tracing::info!(ready_key, "publisher buffer drain routine exiting");
                    return;
                }
            }
        }

        if batch.is_empty() {
            tokio::time::sleep(poll_interval).await;
        } else {
            flush(&store, &ready_key, std::mem::take(&mut batch)).await;
        }
    }
}

async fn flush(store: &Arc<dyn StoreBoxed>, ready_key: &str, batch: Vec<Vec<u8>>) {
    let batch_len = batch.len();
    if let Err(e) = store
        .append_left_boxed(ready_key.to_string(), batch)
        .await
    {
        tracing::warn!(error = %e, ready_key, batch_len, "publisher buffer flush failed, dropping batch");
    }
}
