use crate::amqp::ConnectionError;
use crate::consumers::{BrokerAction, ContentError, HandlerError};
use amq_protocol_types::DeliveryTag;

/// The consumer could not be started.
///
/// Nothing is left running when `start` fails: the connection and channel opened so far, if any,
/// have already been closed.
#[derive(thiserror::Error, Debug)]
#[error("Failed to start consuming from queue `{queue_name}`: {source}")]
pub struct StartError {
    pub queue_name: String,
    #[source]
    pub source: StartFailure,
}

/// The step of the startup sequence that failed.
#[derive(thiserror::Error, Debug)]
pub enum StartFailure {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Failed to open a channel: {0}")]
    Channel(#[source] anyhow::Error),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    Consume(#[from] ConsumeError),
    #[error("The consumer is already running.")]
    AlreadyStarted,
}

/// A required configuration value is missing, blank or unusable.
///
/// Always detected before any network call is made.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Queue Name must not be empty.")]
    BlankQueueName,
    #[error("Connection URI must not be empty.")]
    BlankConnectionUri,
    #[error("Connection host must not be empty.")]
    BlankHost,
    #[error("Either a Connection URI or a structured connection configuration is required.")]
    MissingConnection,
    #[error("Prefetch count must be greater than zero.")]
    ZeroPrefetchCount,
    /// Every payload would fail conversion with this content type.
    #[error("Unsupported content mime type `{mime_type}`: {source}")]
    UnsupportedContentType {
        mime_type: String,
        #[source]
        source: ContentError,
    },
}

/// The queue could not be declared, e.g. because it already exists with different flags.
#[derive(thiserror::Error, Debug)]
#[error("Failed to declare queue `{queue_name}`: {source}")]
pub struct ProvisionError {
    pub queue_name: String,
    #[source]
    pub source: anyhow::Error,
}

/// The subscription to the queue could not be set up.
#[derive(thiserror::Error, Debug)]
#[error("Failed to subscribe to queue `{queue_name}`: {source}")]
pub struct ConsumeError {
    pub queue_name: String,
    #[source]
    pub source: anyhow::Error,
}

/// The broker could not be told the outcome of processing, e.g. because the channel was
/// closed in the meantime.
#[derive(thiserror::Error, Debug)]
#[error("Failed to {action} delivery {delivery_tag}: {source}")]
pub struct AcknowledgmentError {
    pub delivery_tag: DeliveryTag,
    pub action: BrokerAction,
    #[source]
    pub source: anyhow::Error,
}

/// Processing of a single delivery failed.
///
/// The failure is contained to that delivery: the subscription keeps running.
#[derive(thiserror::Error, Debug)]
pub enum ProcessingError {
    /// The payload could not be converted to the configured content type.
    #[error("Failed to convert the message payload.")]
    Conversion(#[source] ContentError),
    /// The handler returned an error.
    #[error("An error was encountered while processing the message.")]
    Handler(#[source] HandlerError),
    /// Processing completed but the outcome could not be communicated to the broker.
    #[error(transparent)]
    Acknowledgment(#[from] AcknowledgmentError),
}
