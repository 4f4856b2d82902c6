use crate::amqp::configuration::ConnectionConfig;
use crate::amqp::transport::{BrokerConnection, Transport};
use crate::amqp::{ConnectionError, ConnectionFactory};
use std::sync::Arc;

/// Turns a [`ConnectionConfig`] into a live connection to the broker.
#[derive(Clone)]
pub struct ConnectionResolver {
    transport: Arc<dyn Transport>,
}

impl ConnectionResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a [`ConnectionFactory`] out of `config`.
    ///
    /// URI parsing and TLS setup happen here, before any network I/O.
    pub fn factory(config: &ConnectionConfig) -> Result<ConnectionFactory, ConnectionError> {
        match config {
            ConnectionConfig::Settings(settings) => ConnectionFactory::new_from_config(settings),
            ConnectionConfig::Uri(uri) => ConnectionFactory::from_uri(uri),
        }
    }

    /// Open a connection to the broker described by `config`.
    ///
    /// Either a fully usable connection is returned or nothing is retained.
    #[tracing::instrument(name = "resolve_connection", skip_all)]
    pub async fn resolve(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn BrokerConnection>, ConnectionError> {
        let factory = Self::factory(config)?;
        self.transport.connect(&factory).await
    }
}
