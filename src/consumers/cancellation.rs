/// A hook invoked when a subscription ends without the consumer asking for it: the broker
/// cancelled it, e.g. because the queue was deleted, or the delivery stream failed.
///
/// The subscription is over once the hook has run: the consumer does not resubscribe.
/// Restarting the consumer is up to the host.
#[async_trait::async_trait]
pub trait CancellationHandler: Send + Sync + 'static {
    async fn on_cancel(&self, queue_name: &str, consumer_tag: &str);

    /// The subscription ended because the delivery stream failed, e.g. the connection broke.
    ///
    /// Logs the failure by default.
    async fn on_failure(&self, queue_name: &str, consumer_tag: &str, error: &anyhow::Error) {
        tracing::error!(
            queue_name,
            consumer_tag,
            error = ?error,
            "The subscription failed, no more messages will be consumed"
        );
    }
}

/// The default [`CancellationHandler`]: it logs the cancellation or the failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCancellation;

#[async_trait::async_trait]
impl CancellationHandler for LogCancellation {
    async fn on_cancel(&self, queue_name: &str, consumer_tag: &str) {
        tracing::warn!(
            queue_name,
            consumer_tag,
            "The broker cancelled the subscription, no more messages will be consumed"
        );
    }
}
