//! What happens to a message between the broker pushing it and the handler being done with it.
//!
//! There are two implementations of [`DeliveryCallback`], one per [`AckMode`]:
//!
//! - [`AutoAck`]: the broker considered the message consumed at delivery time, the handler
//!   outcome is only reported;
//! - [`ExplicitAck`]: the handler outcome decides whether the message is acked or rejected.
//!
//! The variant is picked once, when the consumer starts, via [`delivery_callback_for`].
use crate::consumers::error::{AcknowledgmentError, ProcessingError};
use crate::consumers::{AckMode, Delivery, Handler, InboundMessage, MimeType};
use lapin::options::{BasicAckOptions, BasicNackOptions};
use std::fmt;
use std::sync::Arc;

/// Receives raw deliveries for a subscription and settles them with the broker.
///
/// Deliveries can be handed to `on_delivery` concurrently: implementors must not assume they
/// are invoked one at a time.
#[async_trait::async_trait]
pub trait DeliveryCallback: Send + Sync + 'static {
    /// The acknowledgment discipline the subscription must be set up with.
    fn ack_mode(&self) -> AckMode;

    /// Convert, dispatch and settle a single delivery.
    async fn on_delivery(&self, delivery: Delivery) -> ProcessingOutcome;
}

/// Build the [`DeliveryCallback`] matching `ack_mode`.
pub fn delivery_callback_for(
    ack_mode: AckMode,
    queue_name: &str,
    content_type: MimeType,
    handler: Arc<dyn Handler>,
) -> Arc<dyn DeliveryCallback> {
    let converter = Converter {
        queue_name: queue_name.to_owned(),
        content_type,
    };
    match ack_mode {
        AckMode::AutoAck => Arc::new(AutoAck { converter, handler }),
        AckMode::ExplicitAck => Arc::new(ExplicitAck { converter, handler }),
    }
}

/// The outcome of processing a delivery:
/// - payload conversion;
/// - message handler;
/// - ack/nack against the AMQP broker.
#[derive(Debug)]
pub struct ProcessingOutcome {
    outcome: Result<(), ProcessingError>,
    broker_action: BrokerAction,
}

impl ProcessingOutcome {
    pub fn result(&self) -> &Result<(), ProcessingError> {
        &self.outcome
    }

    /// What the broker was told about the delivery.
    ///
    /// It is reported even if we experienced an issue when dispatching the instruction to the
    /// AMQP broker (e.g. network timeout).
    pub fn broker_action(&self) -> BrokerAction {
        self.broker_action
    }
}

/// The action we asked the broker to take when finalising the processing of
/// the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerAction {
    /// The message was acknowledged by the broker itself at delivery time.
    AutoAck,
    /// Positive acknowledgement - the message can be removed from the queue.
    Ack,
    /// Negative acknowledgement, without requeueing.
    /// The message will be sent to the dead letter exchange if configured, dropped otherwise.
    Nack,
}

impl BrokerAction {
    async fn execute(self, delivery: &Delivery) -> Result<(), AcknowledgmentError> {
        let acker = delivery.acker();
        let result = match self {
            Self::AutoAck => return Ok(()),
            Self::Ack => acker.ack(BasicAckOptions { multiple: false }).await,
            Self::Nack => {
                acker
                    .nack(BasicNackOptions {
                        multiple: false,
                        requeue: false,
                    })
                    .await
            }
        };
        result.map_err(|source| AcknowledgmentError {
            delivery_tag: delivery.delivery_tag,
            action: self,
            source,
        })
    }
}

impl fmt::Display for BrokerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoAck => write!(f, "auto-ack"),
            Self::Ack => write!(f, "ack"),
            Self::Nack => write!(f, "nack"),
        }
    }
}

struct Converter {
    queue_name: String,
    content_type: MimeType,
}

impl Converter {
    fn convert(&self, delivery: &mut Delivery) -> Result<InboundMessage, ProcessingError> {
        let content = self
            .content_type
            .convert(std::mem::take(&mut delivery.data))
            .map_err(ProcessingError::Conversion)?;
        Ok(InboundMessage {
            content,
            content_type: self.content_type.clone(),
            delivery_tag: delivery.delivery_tag,
            redelivered: delivery.redelivered,
            queue_name: self.queue_name.clone(),
        })
    }
}

/// Fire-and-forget processing: the broker does not wait for an acknowledgment and a failure
/// in the handler cannot lead to a redelivery.
pub struct AutoAck {
    converter: Converter,
    handler: Arc<dyn Handler>,
}

#[async_trait::async_trait]
impl DeliveryCallback for AutoAck {
    fn ack_mode(&self) -> AckMode {
        AckMode::AutoAck
    }

    async fn on_delivery(&self, mut delivery: Delivery) -> ProcessingOutcome {
        let outcome = match self.converter.convert(&mut delivery) {
            Ok(message) => self
                .handler
                .handle(message)
                .await
                .map_err(ProcessingError::Handler),
            Err(e) => Err(e),
        };
        ProcessingOutcome {
            outcome,
            broker_action: BrokerAction::AutoAck,
        }
    }
}

/// The delivery is settled only once the handler is done with it: acked on success, rejected
/// without requeueing on failure.
///
/// Requeueing is deliberately never requested, to avoid spinning forever on a message that
/// can't be processed. Configure a dead letter exchange on the queue to keep failed messages.
pub struct ExplicitAck {
    converter: Converter,
    handler: Arc<dyn Handler>,
}

#[async_trait::async_trait]
impl DeliveryCallback for ExplicitAck {
    fn ack_mode(&self) -> AckMode {
        AckMode::ExplicitAck
    }

    async fn on_delivery(&self, mut delivery: Delivery) -> ProcessingOutcome {
        let outcome = match self.converter.convert(&mut delivery) {
            Ok(message) => self
                .handler
                .handle(message)
                .await
                .map_err(ProcessingError::Handler),
            Err(e) => Err(e),
        };
        let broker_action = if outcome.is_ok() {
            BrokerAction::Ack
        } else {
            BrokerAction::Nack
        };

        match broker_action.execute(&delivery).await {
            Ok(()) => ProcessingOutcome {
                outcome,
                broker_action,
            },
            Err(ack_error) => {
                if let Err(processing_error) = &outcome {
                    tracing::error!(
                        error = ?processing_error,
                        delivery_tag = delivery.delivery_tag,
                        "Failed to process message"
                    );
                }
                ProcessingOutcome {
                    outcome: Err(ack_error.into()),
                    broker_action,
                }
            }
        }
    }
}
