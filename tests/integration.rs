//! End-to-end scenarios from spec.md §8, driven against `MemoryStore` so no
//! real Redis-compatible server is needed.

use rmq::{Connection, MemoryStore, StoreBoxed};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn connection() -> Connection {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let store: Arc<dyn StoreBoxed> = Arc::new(MemoryStore::new());
    Connection::new(store, "test-conn")
}

#[tokio::test]
async fn scenario_1_single_consumer_acks_everything() {
    let conn = connection();
    let queue = conn.open_queue("emails");

    queue.publish("a").await;
    queue.publish("b").await;
    queue.publish("c").await;

    queue
        .start_consuming(2, Duration::from_millis(10))
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    queue
        .add_consumer("worker", move |delivery| {
            let seen = Arc::clone(&seen_clone);
            async move {
                seen.lock().unwrap().push(delivery.payload().to_vec());
                delivery.ack().await.unwrap();
            }
        })
        .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut collected = seen.lock().unwrap().clone();
    collected.sort();
    assert_eq!(collected, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[tokio::test]
async fn scenario_2_reject_then_return_all_rejected_then_ack() {
    let conn = connection();
    let queue = conn.open_queue("notices");

    queue.publish("x").await;
    queue
        .start_consuming(4, Duration::from_millis(10))
        .await;

    queue
        .add_consumer("rejector", |delivery| async move {
            delivery.reject().await.unwrap();
        })
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    let moved = queue.return_all_rejected().await;
    assert_eq!(moved, 1);

    let acked = Arc::new(AtomicUsize::new(0));
    let acked_clone = Arc::clone(&acked);
    queue
        .add_consumer("acker", move |delivery| {
            let acked = Arc::clone(&acked_clone);
            async move {
                acked.fetch_add(1, Ordering::SeqCst);
                delivery.ack().await.unwrap();
            }
        })
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(acked.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_3_publisher_buffer_coalesces_appends() {
    let conn = connection();
    let queue = conn.open_queue("bulk");

    queue
        .set_publish_buffer_size(10, Duration::from_millis(5))
        .await;

    for i in 0..25 {
        assert!(queue.publish(format!("p{i}")).await);
    }

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Draining back to no buffer flushes whatever is outstanding.
    queue.set_publish_buffer_size(0, Duration::from_millis(5)).await;
}

#[tokio::test]
async fn scenario_4_prefetch_bound_holds_with_a_stalled_consumer() {
    let conn = connection();
    let queue = conn.open_queue("stalled");

    queue
        .start_consuming(5, Duration::from_millis(10))
        .await;

    let held = Arc::new(Mutex::new(Vec::new()));
    let held_clone = Arc::clone(&held);
    queue
        .add_consumer("hoarder", move |delivery| {
            let held = Arc::clone(&held_clone);
            async move {
                // Never acks: deliveries pile up in unacked.
                held.lock().unwrap().push(delivery);
            }
        })
        .await;

    for i in 0..20 {
        queue.publish(format!("item{i}")).await;
    }

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(held.lock().unwrap().len() <= 6);
}

#[tokio::test]
async fn scenario_5_batch_consumer_flushes_on_deadline() {
    let conn = connection();
    let queue = conn.open_queue("batched");

    queue
        .start_consuming(10, Duration::from_millis(10))
        .await;

    let batches = Arc::new(AtomicUsize::new(0));
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let batches_clone = Arc::clone(&batches);
    let sizes_clone = Arc::clone(&sizes);
    queue
        .add_batch_consumer("batcher", 10, move |batch| {
            let batches = Arc::clone(&batches_clone);
            let sizes = Arc::clone(&sizes_clone);
            async move {
                batches.fetch_add(1, Ordering::SeqCst);
                sizes.lock().unwrap().push(batch.len());
                for delivery in batch {
                    delivery.ack().await.unwrap();
                }
            }
        })
        .await;

    queue.publish("1").await;
    queue.publish("2").await;
    queue.publish("3").await;

    tokio::time::sleep(Duration::from_millis(1300)).await;

    assert_eq!(batches.load(Ordering::SeqCst), 1);
    assert_eq!(sizes.lock().unwrap().as_slice(), &[3]);
}

#[tokio::test]
async fn scenario_6_push_forwards_to_another_queues_ready_list() {
    let conn = connection();
    let queue_a = conn.open_queue("a");
    let queue_b = conn.open_queue("b");
    queue_a.set_push_queue(&queue_b);

    queue_a.publish("z").await;
    queue_a
        .start_consuming(4, Duration::from_millis(10))
        .await;
    queue_a
        .add_consumer("pusher", |delivery| async move {
            delivery.push().await.unwrap();
        })
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    queue_b
        .start_consuming(4, Duration::from_millis(10))
        .await;
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = Arc::clone(&received);
    queue_b
        .add_consumer("b-consumer", move |delivery| {
            let received = Arc::clone(&received_clone);
            async move {
                received.lock().unwrap().push(delivery.payload().to_vec());
                delivery.ack().await.unwrap();
            }
        })
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(received.lock().unwrap().as_slice(), &[b"z".to_vec()]);
}

#[tokio::test]
async fn boundary_add_consumer_before_start_consuming_panics() {
    let conn = Arc::new(connection());
    let conn_clone = Arc::clone(&conn);

    let joined = tokio::spawn(async move {
        let queue = conn_clone.open_queue("idle");
        queue.add_consumer("worker", |_d| async {}).await;
    })
    .await;

    assert!(joined.is_err(), "add_consumer before start_consuming should panic");
}

#[tokio::test]
async fn boundary_start_consuming_twice_returns_false_the_second_time() {
    let conn = connection();
    let queue = conn.open_queue("idle2");

    assert!(queue.start_consuming(4, Duration::from_millis(10)).await);
    assert!(!queue.start_consuming(4, Duration::from_millis(10)).await);
}
