use crate::amqp::transport::Transport;
use crate::amqp::LapinTransport;
use crate::consumers::{
    CancellationHandler, ConsumerSettings, Handler, LogCancellation, QueueConsumer,
};
use std::sync::Arc;
use std::time::Duration;

/// A builder to compose a [`QueueConsumer`] with a fluent API.
///
/// Use [`QueueConsumer::builder`] as entrypoint.
pub struct QueueConsumerBuilder {
    settings: ConsumerSettings,
    transport: Arc<dyn Transport>,
    cancellation_handler: Arc<dyn CancellationHandler>,
    shutdown_timeout: Duration,
}

impl QueueConsumerBuilder {
    pub(in crate::consumers) fn new(settings: ConsumerSettings) -> Self {
        Self {
            settings,
            transport: Arc::new(LapinTransport),
            cancellation_handler: Arc::new(LogCancellation),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    /// Replace the AMQP client used to reach the broker.
    ///
    /// By default, the consumer connects through `lapin` ([`LapinTransport`]).
    #[must_use]
    pub fn with_transport<T: Transport>(mut self, transport: T) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Specify what happens when the broker cancels the subscription on its own.
    ///
    /// By default, the cancellation is logged ([`LogCancellation`]).
    #[must_use]
    pub fn with_cancellation_handler<H: CancellationHandler>(mut self, handler: H) -> Self {
        self.cancellation_handler = Arc::new(handler);
        self
    }

    /// How long [`QueueConsumer::shutdown`] waits for the subscription to be cancelled with the
    /// broker before closing the channel anyway. Defaults to 5 seconds.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the handler every consumed message is dispatched to and finish building the
    /// consumer.
    ///
    /// Nothing happens until [`QueueConsumer::start`] is called.
    pub fn handler<H: Handler>(self, handler: H) -> QueueConsumer {
        self.dyn_handler(Arc::new(handler))
    }

    /// Finish building the consumer with a shared handler, see [`QueueConsumerBuilder::handler`].
    pub fn dyn_handler(self, handler: Arc<dyn Handler>) -> QueueConsumer {
        QueueConsumer {
            settings: self.settings,
            handler,
            transport: self.transport,
            cancellation_handler: self.cancellation_handler,
            shutdown_timeout: self.shutdown_timeout,
            subscription: None,
        }
    }
}
