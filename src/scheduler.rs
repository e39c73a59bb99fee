//! Prefetch/poll loop and worker dispatch for a single queue.

use crate::delivery::Delivery;
use crate::fatal;
use crate::keys::KeyLayout;
use crate::store::StoreBoxed;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Running,
    Stopping,
}

type DeliveryReceiver = Arc<Mutex<mpsc::Receiver<Delivery>>>;

struct Inner {
    state: SchedulerState,
    prefetch_limit: usize,
    stop_flag: Arc<AtomicBool>,
    poll_handle: Option<JoinHandle<()>>,
    buffer_rx: Option<DeliveryReceiver>,
}

/// Per-queue prefetch loop plus fan-out to worker routines.
///
/// State machine: `Idle -> Running -> Stopping` (terminal), matching
/// spec.md §4.5. `Running` spawns exactly one poll routine; each
/// `add_consumer`/`add_batch_consumer` call spawns one worker routine that
/// shares the same in-memory delivery buffer with every other registered
/// worker via a mutex-guarded receiver (Rust's single-owner `mpsc::Receiver`
/// has no built-in fan-out, so cooperative locking is the idiomatic
/// stand-in for "fans out to worker routines").
pub(crate) struct ConsumerScheduler {
    store: Arc<dyn StoreBoxed>,
    ready_key: String,
    unacked_key: String,
    rejected_key: String,
    consumers_key: String,
    queue_name: String,
    push_key: Arc<StdRwLock<Option<String>>>,
    inner: Mutex<Inner>,
}

impl ConsumerScheduler {
    pub(crate) fn new(
        store: Arc<dyn StoreBoxed>,
        queue_name: String,
        connection_name: String,
        push_key: Arc<StdRwLock<Option<String>>>,
    ) -> Self {
        Self {
            ready_key: KeyLayout::ready(&queue_name),
            unacked_key: KeyLayout::unacked(&connection_name, &queue_name),
            rejected_key: KeyLayout::rejected(&queue_name),
            consumers_key: KeyLayout::consumers(&connection_name, &queue_name),
            queue_name,
            push_key,
            store,
            inner: Mutex::new(Inner {
                state: SchedulerState::Idle,
                prefetch_limit: 0,
                stop_flag: Arc::new(AtomicBool::new(false)),
                poll_handle: None,
                buffer_rx: None,
            }),
        }
    }

    /// `startConsuming(prefetchLimit, pollInterval)`. Returns `false` and
    /// does nothing if already running (or stopping) — `Idle` is the only
    /// state this transitions out of.
    pub(crate) async fn start_consuming(&self, prefetch_limit: usize, poll_interval: Duration) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state != SchedulerState::Idle {
            return false;
        }

        fatal::expect(
            "register queue in queues set",
            self.store
                .set_add_boxed(KeyLayout::queues(), self.queue_name.clone())
                .await,
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel(prefetch_limit.max(1));

        let poll_handle = tokio::spawn(poll_loop(
            Arc::clone(&self.store),
            self.ready_key.clone(),
            self.unacked_key.clone(),
            self.rejected_key.clone(),
            Arc::clone(&self.push_key),
            prefetch_limit,
            poll_interval,
            Arc::clone(&stop_flag),
            tx,
        ));

        inner.prefetch_limit = prefetch_limit;
        inner.stop_flag = stop_flag;
        inner.poll_handle = Some(poll_handle);
        inner.buffer_rx = Some(Arc::new(Mutex::new(rx)));
        inner.state = SchedulerState::Running;
        true
    }

    /// `stopConsuming`. Cooperative: sets the stop flag without closing the
    /// in-memory buffer, so workers keep draining whatever was already
    /// prefetched. Returns `false` if not currently running.
    pub(crate) async fn stop_consuming(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state != SchedulerState::Running {
            return false;
        }
        inner.stop_flag.store(true, Ordering::Release);
        inner.state = SchedulerState::Stopping;
        true
    }

    /// `addConsumer(tag)`. Panics if not currently running, per spec.md
    /// §8's "fatal caller error".
    pub(crate) async fn add_consumer<F, Fut>(&self, tag: &str, callback: F) -> String
    where
        F: Fn(Delivery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let rx = self.register_consumer(tag).await;
        let name = rx.1;
        tokio::spawn(single_worker(rx.0, callback));
        name
    }

    /// `addBatchConsumer(tag, size)`. Panics if not currently running.
    pub(crate) async fn add_batch_consumer<F, Fut>(
        &self,
        tag: &str,
        batch_size: usize,
        callback: F,
    ) -> String
    where
        F: Fn(Vec<Delivery>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let rx = self.register_consumer(tag).await;
        let name = rx.1;
        tokio::spawn(batch_worker(rx.0, batch_size.max(1), callback));
        name
    }

    async fn register_consumer(&self, tag: &str) -> (DeliveryReceiver, String) {
        let inner = self.inner.lock().await;
        if inner.state != SchedulerState::Running {
            panic!("add_consumer called while the scheduler is not running");
        }
        let rx = inner
            .buffer_rx
            .as_ref()
            .expect("buffer_rx is set whenever state is Running")
            .clone();
        drop(inner);

        let name = format!("{tag}-{}", crate::util::random_token(6));
        fatal::expect(
            "register consumer",
            self.store
                .set_add_boxed(self.consumers_key.clone(), name.clone())
                .await,
        );
        (rx, name)
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    store: Arc<dyn StoreBoxed>,
    ready_key: String,
    unacked_key: String,
    rejected_key: String,
    push_key: Arc<StdRwLock<Option<String>>>,
    prefetch_limit: usize,
    poll_interval: Duration,
    stop_flag: Arc<AtomicBool>,
    tx: mpsc::Sender<Delivery>,
) {
    loop {
        if stop_flag.load(Ordering::Acquire) {
            tracing::info!(ready_key, "poll loop stopping");
            return;
        }

        let buffered = prefetch_limit.saturating_sub(tx.capacity());
        let ready_len = fatal::expect(
            "read ready list length",
            store.length_boxed(ready_key.clone()).await,
        ) as usize;
        let batch_size = std::cmp::min(prefetch_limit.saturating_sub(buffered), ready_len);

        if batch_size == 0 {
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        for _ in 0..batch_size {
            match store
                .pop_right_push_left_boxed(ready_key.clone(), unacked_key.clone())
                .await
            {
                Ok(Some(payload)) => {
                    let delivery = Delivery::new(
                        payload,
                        Arc::clone(&store),
                        unacked_key.clone(),
                        rejected_key.clone(),
                        Arc::clone(&push_key),
                    );
                    tracing::debug!(ready_key, "moved delivery ready -> unacked");
                    if tx.send(delivery).await.is_err() {
                        // every worker/buffer receiver is gone; nothing left to do.
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => fatal::abort("poll ready -> unacked move", e),
            }
        }
    }
}

async fn single_worker<F, Fut>(rx: DeliveryReceiver, callback: F)
where
    F: Fn(Delivery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        let delivery = {
            let mut guard = rx.lock().await;
            guard.recv().await
        };
        match delivery {
            Some(delivery) => callback(delivery).await,
            None => return,
        }
    }
}

const BATCH_DEADLINE: Duration = Duration::from_secs(1);

async fn batch_worker<F, Fut>(rx: DeliveryReceiver, batch_size: usize, callback: F)
where
    F: Fn(Vec<Delivery>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut batch = Vec::with_capacity(batch_size);
    let mut deadline = Instant::now() + BATCH_DEADLINE;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let next = {
            let mut guard = rx.lock().await;
            tokio::time::timeout(remaining, guard.recv()).await
        };

        match next {
            Ok(Some(delivery)) => {
                batch.push(delivery);
                if batch.len() >= batch_size {
                    callback(std::mem::take(&mut batch)).await;
                    deadline = Instant::now() + BATCH_DEADLINE;
                }
            }
            Ok(None) => {
                if !batch.is_empty() {
                    callback(std::mem::take(&mut batch)).await;
                }
                return;
            }
            Err(_elapsed) => {
                if !batch.is_empty() {
                    callback(std::mem::take(&mut batch)).await;
                }
                deadline = Instant::now() + BATCH_DEADLINE;
            }
        }
    }
}
