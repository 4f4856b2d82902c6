use crate::helpers::{
    eventually, random_queue_name, uri_settings, Call, FakeBroker, Operation, RecordingHandler,
};
use carrot_inbound::consumers::{AckMode, Content, ConsumerSettings, MimeType, QueueConsumer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

async fn start(
    settings: ConsumerSettings,
    broker: &FakeBroker,
    handler: &RecordingHandler,
) -> QueueConsumer {
    let mut consumer = QueueConsumer::builder(settings)
        .with_transport(broker.clone())
        .handler(handler.clone());
    consumer.start().await.unwrap();
    consumer
}

fn acks(broker: &FakeBroker) -> usize {
    broker.count(|c| matches!(c, Call::Ack(_) | Call::Nack { .. }))
}

#[tokio::test]
async fn successful_processing_is_acked() {
    // Arrange
    let broker = FakeBroker::new();
    let handler = RecordingHandler::default();
    let mut settings = uri_settings("q1");
    settings.ack_mode = AckMode::ExplicitAck;
    let mut consumer = start(settings, &broker, &handler).await;

    // Act
    broker.deliver(7, b"hello");
    eventually(|| acks(&broker) == 1).await;

    // Assert
    let received = handler.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].content, Content::Text("hello".into()));
    assert_eq!(received[0].content_type.to_string(), "text/plain");
    assert_eq!(received[0].delivery_tag, 7);
    assert_eq!(received[0].queue_name, "q1");
    assert_eq!(broker.count(|c| *c == Call::Ack(7)), 1);
    assert_eq!(broker.count(|c| matches!(c, Call::Nack { .. })), 0);
    consumer.shutdown().await;
}

#[tokio::test]
async fn failed_processing_is_rejected_without_requeueing() {
    // Arrange
    let broker = FakeBroker::new();
    let handler = RecordingHandler::default();
    let mut consumer = start(uri_settings("q1"), &broker, &handler).await;

    // Act
    broker.deliver(3, b"fail");
    eventually(|| acks(&broker) == 1).await;

    // Assert
    assert_eq!(
        broker.count(|c| *c
            == Call::Nack {
                delivery_tag: 3,
                requeue: false
            }),
        1
    );
    assert_eq!(broker.count(|c| matches!(c, Call::Ack(_))), 0);
    assert_eq!(handler.received().len(), 1);
    consumer.shutdown().await;
}

#[tokio::test]
async fn payloads_that_cannot_be_converted_are_rejected_without_reaching_the_handler() {
    // Arrange
    let broker = FakeBroker::new();
    let handler = RecordingHandler::default();
    let mut consumer = start(uri_settings(&random_queue_name()), &broker, &handler).await;

    // Act
    broker.deliver(1, &[0xff, 0xfe, 0xfd]);
    eventually(|| acks(&broker) == 1).await;

    // Assert
    assert_eq!(
        broker.calls().last(),
        Some(&Call::Nack {
            delivery_tag: 1,
            requeue: false
        })
    );
    assert!(handler.received().is_empty());
    consumer.shutdown().await;
}

#[tokio::test]
async fn binary_content_types_keep_the_raw_payload() {
    // Arrange
    let broker = FakeBroker::new();
    let handler = RecordingHandler::default();
    let mut settings = uri_settings(&random_queue_name());
    settings.content_mime_type = MimeType::APPLICATION_BINARY.into();
    let mut consumer = start(settings, &broker, &handler).await;

    // Act
    broker.deliver(1, &[0xff, 0x00]);
    eventually(|| acks(&broker) == 1).await;

    // Assert
    assert_eq!(
        handler.received()[0].content,
        Content::Binary(vec![0xff, 0x00])
    );
    assert_eq!(broker.count(|c| *c == Call::Ack(1)), 1);
    consumer.shutdown().await;
}

#[tokio::test]
async fn auto_ack_subscriptions_never_settle_deliveries_themselves() {
    // Arrange
    let broker = FakeBroker::new();
    let handler = RecordingHandler::default();
    let queue_name = random_queue_name();
    let mut settings = uri_settings(&queue_name);
    settings.ack_mode = AckMode::AutoAck;
    let mut consumer = start(settings, &broker, &handler).await;

    // Act
    broker.deliver(1, b"hello");
    broker.deliver(2, b"fail");
    eventually(|| handler.received().len() == 2).await;
    // Give a chance to any (wrong) acknowledgment to reach the broker.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(
        broker.count(|c| *c
            == Call::BasicConsume {
                queue_name: queue_name.clone(),
                no_ack: true
            }),
        1
    );
    assert_eq!(acks(&broker), 0);
    consumer.shutdown().await;
}

#[tokio::test]
async fn deliveries_are_processed_concurrently() {
    // Arrange
    let broker = FakeBroker::new();
    let gate = Arc::new(Notify::new());
    let handler = RecordingHandler::gated(gate.clone());
    let mut consumer = start(uri_settings(&random_queue_name()), &broker, &handler).await;

    // Act
    broker.deliver(1, b"first");
    broker.deliver(2, b"second");

    // Assert
    // Both messages reach the handler while neither has completed.
    eventually(|| handler.received().len() == 2).await;
    assert_eq!(acks(&broker), 0);

    gate.notify_waiters();
    eventually(|| acks(&broker) == 2).await;
    assert_eq!(broker.count(|c| *c == Call::Ack(1)), 1);
    assert_eq!(broker.count(|c| *c == Call::Ack(2)), 1);
    consumer.shutdown().await;
}

#[tokio::test]
async fn a_failed_acknowledgment_does_not_end_the_subscription() {
    // Arrange
    let broker = FakeBroker::new().failing(Operation::Ack);
    let handler = RecordingHandler::default();
    let mut consumer = start(uri_settings(&random_queue_name()), &broker, &handler).await;

    // Act
    broker.deliver(1, b"first");
    eventually(|| handler.received().len() == 1).await;
    broker.deliver(2, b"second");

    // Assert
    eventually(|| handler.received().len() == 2).await;
    assert!(consumer.is_running());
    assert_eq!(acks(&broker), 0);
    consumer.shutdown().await;
}

#[tokio::test]
async fn in_flight_deliveries_do_not_prevent_shutdown() {
    // Arrange
    let broker = FakeBroker::new();
    let gate = Arc::new(Notify::new());
    let handler = RecordingHandler::gated(gate.clone());
    let mut consumer = start(uri_settings(&random_queue_name()), &broker, &handler).await;
    broker.deliver(1, b"slow");
    eventually(|| handler.received().len() == 1).await;

    // Act
    consumer.shutdown().await;
    gate.notify_waiters();
    // Let the in-flight delivery attempt its acknowledgment on the closed channel.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert
    let calls = broker.calls();
    assert_eq!(
        calls[calls.len() - 2..],
        [Call::CloseChannel, Call::CloseConnection]
    );
    assert_eq!(acks(&broker), 0);
}

#[tokio::test]
async fn the_prefetch_count_caps_deliveries_in_flight_even_with_auto_ack() {
    // Arrange
    let broker = FakeBroker::new();
    let gate = Arc::new(Notify::new());
    let handler = RecordingHandler::gated(gate.clone());
    let mut settings = uri_settings(&random_queue_name());
    settings.ack_mode = AckMode::AutoAck;
    settings.prefetch_count = 2;
    let mut consumer = start(settings, &broker, &handler).await;

    // Act
    for delivery_tag in 1..=5 {
        broker.deliver(delivery_tag, b"hello");
    }
    eventually(|| handler.received().len() == 2).await;
    // Give a chance to any (wrong) extra delivery to reach the handler.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(handler.received().len(), 2);
    // Every completed delivery frees a slot for the next one.
    eventually(|| {
        gate.notify_waiters();
        handler.received().len() == 5
    })
    .await;
    let mut tags: Vec<_> = handler.received().iter().map(|m| m.delivery_tag).collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![1, 2, 3, 4, 5]);
    consumer.shutdown().await;
}
