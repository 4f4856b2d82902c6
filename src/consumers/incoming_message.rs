use crate::amqp::transport::{Acknowledger, LapinAcker};
use crate::consumers::{Content, MimeType};
use amq_protocol_types::DeliveryTag;
use std::sync::Arc;

/// A message pushed by the broker, before any processing has happened.
pub struct Delivery {
    /// The broker-assigned identifier of this delivery.
    ///
    /// It is only meaningful on the channel the message was delivered on.
    pub delivery_tag: DeliveryTag,
    /// Whether this message was delivered before.
    pub redelivered: bool,
    /// The payload of the message in binary format.
    pub data: Vec<u8>,
    // Hidden from public interface, to stop a message being acked / rejected inside a message handler.
    // AMQP protocol specifics that a message must not be acked /rejected multiple times:
    // https://www.rabbitmq.com/amqp-0-9-1-reference.html#basic.ack.delivery-tag
    acker: Arc<dyn Acknowledger>,
}

impl Delivery {
    /// Assemble a delivery coming from a [`Transport`](crate::amqp::transport::Transport)
    /// implementation. `acker` settles this delivery, and this delivery only.
    pub fn new(
        delivery_tag: DeliveryTag,
        data: Vec<u8>,
        redelivered: bool,
        acker: impl Acknowledger,
    ) -> Self {
        Self {
            delivery_tag,
            redelivered,
            data,
            acker: Arc::new(acker),
        }
    }

    pub(crate) fn acker(&self) -> &dyn Acknowledger {
        self.acker.as_ref()
    }
}

impl From<lapin::message::Delivery> for Delivery {
    fn from(value: lapin::message::Delivery) -> Self {
        Self::new(
            value.delivery_tag,
            value.data,
            value.redelivered,
            LapinAcker(value.acker),
        )
    }
}

/// A delivered message, converted according to the consumer's content type and ready to be
/// handed to a [`Handler`](crate::consumers::Handler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub content: Content,
    pub content_type: MimeType,
    pub delivery_tag: DeliveryTag,
    pub redelivered: bool,
    /// The queue the message was consumed from.
    pub queue_name: String,
}
