mod common;

use common::{fast_retry, ORDERS};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use order_pipeline::messaging::clients::InMemoryBroker;
use order_pipeline::messaging::{
    ConnectionManager, ConnectionState, MessagingError, OrderProducer, PublishError,
    PublishFailure, SubmitError,
};
use order_pipeline::resilience::RetryPolicy;
use order_pipeline::validation::{CreateOrderRequest, UpdateOrderRequest};

#[tokio::test]
async fn test_events_of_one_order_share_a_key() {
    let broker = InMemoryBroker::new();
    let producer = OrderProducer::new(broker.clone(), ORDERS, fast_retry(5), Duration::from_secs(1));

    producer
        .submit_create(CreateOrderRequest {
            order_id: "A1".to_string(),
            items_num: 2,
            total_amount: 100.0,
        })
        .await
        .unwrap();
    producer
        .submit_update(UpdateOrderRequest {
            order_id: "A1".to_string(),
            status: "pending".to_string(),
        })
        .await
        .unwrap();

    let keys: Vec<Option<Vec<u8>>> = broker.messages(ORDERS).into_iter().map(|m| m.key).collect();
    assert_eq!(keys, vec![Some(b"A1".to_vec()), Some(b"A1".to_vec())]);
}

#[tokio::test]
async fn test_invalid_requests_are_not_published() {
    let broker = InMemoryBroker::new();
    let producer = OrderProducer::new(broker.clone(), ORDERS, fast_retry(5), Duration::from_secs(1));

    let err = producer
        .submit_update(UpdateOrderRequest {
            order_id: "A1".to_string(),
            status: "new".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));

    let err = producer
        .submit_create(CreateOrderRequest {
            order_id: "A2".to_string(),
            items_num: 0,
            total_amount: 10.0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Number of items must be at least 1");

    assert_eq!(broker.publish_calls(), 0);
}

#[tokio::test]
async fn test_exhausted_publish_reports_through_hook() {
    let broker = InMemoryBroker::new();
    broker.fail_topic(ORDERS);

    let failures: Arc<Mutex<Vec<PublishFailure>>> = Arc::default();
    let sink = Arc::clone(&failures);
    let producer = OrderProducer::new(broker.clone(), ORDERS, fast_retry(5), Duration::from_secs(1))
        .with_failure_hook(Arc::new(move |failure: &PublishFailure| {
            sink.lock().push(failure.clone())
        }));

    let started = Instant::now();
    assert_eq!(producer.publish("{}", "A1").await, Ok(()));
    // 1 + 2 + 4 + 8 ms of backoff between five attempts
    assert!(started.elapsed() >= Duration::from_millis(15));

    assert_eq!(broker.publish_calls(), 5);
    assert_eq!(producer.abandoned_count(), 1);
    let failures = failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].topic, ORDERS);
    assert!(failures[0].last_error.contains("injected publish failure"));

    broker.restore_topic(ORDERS);
}

#[tokio::test]
async fn test_failed_connection_leaves_producer_unready() {
    let broker = InMemoryBroker::new();
    let connection = ConnectionManager::new("order-producer", fast_retry(5));

    let result = connection
        .connect(|_| async { Err::<(), _>(MessagingError::broker("connection refused")) })
        .await;
    let err = result.unwrap_err();
    assert_eq!(err.attempts, 5);
    assert_eq!(connection.state(), ConnectionState::Unavailable);

    let producer = OrderProducer::unready(ORDERS, fast_retry(5), Duration::from_secs(1));
    assert_eq!(
        producer.publish("{}", "A1").await,
        Err(PublishError::NotInitialized)
    );
    assert_eq!(broker.publish_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_publishes_share_one_producer() {
    let broker = InMemoryBroker::new();
    let producer = Arc::new(OrderProducer::new(
        broker.clone(),
        ORDERS,
        RetryPolicy::exponential(5, 2).with_unit(Duration::from_millis(1)),
        Duration::from_secs(1),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let producer = Arc::clone(&producer);
            tokio::spawn(async move {
                let key = format!("order-{i}");
                producer.publish(&format!(r#"{{"orderId":"{key}"}}"#), &key).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(broker.messages(ORDERS).len(), 16);
}
