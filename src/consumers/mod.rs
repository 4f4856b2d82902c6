//! Facilities to consume messages from a RabbitMq queue. Check out [`QueueConsumer`] as a
//! starting point.
pub use builders::QueueConsumerBuilder;
pub use cancellation::{CancellationHandler, LogCancellation};
pub use configuration::{AckMode, ConsumerSettings, QueueSettings};
pub use consumer::QueueConsumer;
pub use content::{Content, ContentError, MimeType};
pub use delivery::{
    delivery_callback_for, AutoAck, BrokerAction, DeliveryCallback, ExplicitAck,
    ProcessingOutcome,
};
pub use error::{
    AcknowledgmentError, ConfigurationError, ConsumeError, ProcessingError, ProvisionError,
    StartError, StartFailure,
};
pub use handler::{ClosureHandler, Handler, HandlerError};
pub use incoming_message::{Delivery, InboundMessage};
pub use provisioner::QueueProvisioner;
pub use resolver::ConnectionResolver;

// Re-export for convenience
pub use crate::amqp::ConnectionError;

mod builders;
mod cancellation;
mod configuration;
mod consumer;
mod content;
mod delivery;
mod error;
mod handler;
mod incoming_message;
mod provisioner;
mod resolver;
