use crate::amqp::transport::BrokerChannel;
use crate::consumers::error::ProvisionError;
use crate::consumers::QueueSettings;
use lapin::options::QueueDeclareOptions;

/// Declares the queue, when asked to, before the consumer subscribes to it.
pub struct QueueProvisioner;

impl QueueProvisioner {
    /// Declare `queue_name` with the flags in `queue_settings`.
    ///
    /// It does nothing if `queue_settings` is `None` or `declare` is false: the queue is then
    /// assumed to already exist on the broker.
    /// Re-declaring a queue with the same flags is a no-op for the broker, while different
    /// flags make the declaration fail.
    #[tracing::instrument(name = "provision_queue", skip(channel))]
    pub async fn provision(
        channel: &dyn BrokerChannel,
        queue_name: &str,
        queue_settings: Option<&QueueSettings>,
    ) -> Result<(), ProvisionError> {
        let Some(settings) = queue_settings.filter(|s| s.declare) else {
            return Ok(());
        };
        let options = QueueDeclareOptions {
            passive: false,
            durable: settings.durable,
            exclusive: settings.exclusive,
            auto_delete: settings.auto_delete,
            nowait: false,
        };
        channel
            .queue_declare(queue_name, options)
            .await
            .map_err(|source| ProvisionError {
                queue_name: queue_name.to_owned(),
                source,
            })?;
        tracing::info!("Declared queue");
        Ok(())
    }
}
