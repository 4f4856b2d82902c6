use std::time::Duration;

/// Failure to establish a connection with the RabbitMq broker.
///
/// No partially initialised connection survives any of these failures.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    /// The AMQP URI could not be parsed.
    #[error("The connection URI is malformed: {0}")]
    InvalidUri(String),
    /// The TLS connector could not be built from the provided settings.
    #[error("Failed to configure TLS for the RabbitMq connection: {0}")]
    Tls(#[source] anyhow::Error),
    /// The broker did not complete the handshake in time.
    #[error("Timed out after {0:?} while connecting to the RabbitMq broker.")]
    Timeout(Duration),
    /// I/O, authentication or protocol negotiation failure.
    #[error("Failed to connect to the RabbitMq broker: {0}")]
    Broker(#[source] anyhow::Error),
}

impl From<lapin::Error> for ConnectionError {
    fn from(err: lapin::Error) -> Self {
        Self::Broker(err.into())
    }
}
