//! The narrow slice of the AMQP 0-9-1 client surface a queue consumer relies on.
//!
//! [`QueueConsumer`](crate::consumers::QueueConsumer) never talks to `lapin` directly: it goes
//! through the traits in this module. [`LapinTransport`] is the production implementation;
//! anything else speaking AMQP 0-9-1 (or a recording fake, in tests) can be plugged in.
use crate::amqp::{ConnectionError, ConnectionFactory};
use crate::consumers::Delivery;
use futures_util::{stream::BoxStream, StreamExt};
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use std::sync::Arc;

/// The stream of messages pushed by the broker for a single subscription.
///
/// The stream ends when the subscription is cancelled, either by us or by the broker.
pub type DeliveryStream = BoxStream<'static, Result<Delivery, anyhow::Error>>;

/// Opens connections to a broker.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a new connection using the address, credentials and options held by `factory`.
    ///
    /// Implementations must not retain anything if connecting fails.
    async fn connect(
        &self,
        factory: &ConnectionFactory,
    ) -> Result<Arc<dyn BrokerConnection>, ConnectionError>;
}

/// A live transport session with the broker.
#[async_trait::async_trait]
pub trait BrokerConnection: Send + Sync + 'static {
    async fn create_channel(&self) -> Result<Arc<dyn BrokerChannel>, anyhow::Error>;

    async fn close(&self) -> Result<(), anyhow::Error>;
}

/// A logical session multiplexed over a [`BrokerConnection`].
#[async_trait::async_trait]
pub trait BrokerChannel: Send + Sync + 'static {
    /// Limit the number of unacknowledged deliveries in flight for this channel.
    async fn basic_qos(&self, prefetch_count: u16) -> Result<(), anyhow::Error>;

    async fn queue_declare(
        &self,
        queue_name: &str,
        options: QueueDeclareOptions,
    ) -> Result<(), anyhow::Error>;

    /// Subscribe to `queue_name`.
    ///
    /// With `options.no_ack` set the broker considers each message consumed as soon as it is
    /// delivered.
    async fn basic_consume(
        &self,
        queue_name: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
    ) -> Result<DeliveryStream, anyhow::Error>;

    async fn basic_cancel(&self, consumer_tag: &str) -> Result<(), anyhow::Error>;

    async fn close(&self) -> Result<(), anyhow::Error>;
}

/// Settles a single delivery with the broker.
///
/// An `Acknowledger` is bound to the delivery it was handed out with: it always targets that
/// delivery's tag.
#[async_trait::async_trait]
pub trait Acknowledger: Send + Sync + 'static {
    async fn ack(&self, options: BasicAckOptions) -> Result<(), anyhow::Error>;

    async fn nack(&self, options: BasicNackOptions) -> Result<(), anyhow::Error>;
}

/// [`Transport`] backed by `lapin`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LapinTransport;

#[async_trait::async_trait]
impl Transport for LapinTransport {
    async fn connect(
        &self,
        factory: &ConnectionFactory,
    ) -> Result<Arc<dyn BrokerConnection>, ConnectionError> {
        if factory.automatic_recovery() {
            // lapin 2.x cannot recover connections: a broken connection ends the subscription.
            tracing::warn!(
                "Automatic recovery was requested but is not supported by the AMQP client, \
                 broken connections will not be recovered."
            );
        }
        let connection = factory.new_connection().await?;
        Ok(Arc::new(LapinConnection(connection)))
    }
}

struct LapinConnection(lapin::Connection);

#[async_trait::async_trait]
impl BrokerConnection for LapinConnection {
    async fn create_channel(&self) -> Result<Arc<dyn BrokerChannel>, anyhow::Error> {
        let channel = self.0.create_channel().await?;
        Ok(Arc::new(LapinChannel(channel)))
    }

    async fn close(&self) -> Result<(), anyhow::Error> {
        self.0.close(200, "OK").await?;
        Ok(())
    }
}

struct LapinChannel(lapin::Channel);

#[async_trait::async_trait]
impl BrokerChannel for LapinChannel {
    async fn basic_qos(&self, prefetch_count: u16) -> Result<(), anyhow::Error> {
        self.0
            .basic_qos(prefetch_count, BasicQosOptions { global: false })
            .await?;
        Ok(())
    }

    async fn queue_declare(
        &self,
        queue_name: &str,
        options: QueueDeclareOptions,
    ) -> Result<(), anyhow::Error> {
        self.0
            .queue_declare(queue_name, options, FieldTable::default())
            .await?;
        Ok(())
    }

    async fn basic_consume(
        &self,
        queue_name: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
    ) -> Result<DeliveryStream, anyhow::Error> {
        let consumer = self
            .0
            .basic_consume(queue_name, consumer_tag, options, FieldTable::default())
            .await?;
        Ok(consumer
            .map(|event| event.map(Delivery::from).map_err(anyhow::Error::from))
            .boxed())
    }

    async fn basic_cancel(&self, consumer_tag: &str) -> Result<(), anyhow::Error> {
        self.0
            .basic_cancel(consumer_tag, BasicCancelOptions::default())
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), anyhow::Error> {
        self.0.close(200, "OK").await?;
        Ok(())
    }
}

pub(crate) struct LapinAcker(pub(crate) lapin::acker::Acker);

#[async_trait::async_trait]
impl Acknowledger for LapinAcker {
    async fn ack(&self, options: BasicAckOptions) -> Result<(), anyhow::Error> {
        self.0.ack(options).await?;
        Ok(())
    }

    async fn nack(&self, options: BasicNackOptions) -> Result<(), anyhow::Error> {
        self.0.nack(options).await?;
        Ok(())
    }
}
