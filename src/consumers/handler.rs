//! The `Handler` trait is heavily inspired by `tide`'s approach to endpoint handlers.
use crate::consumers::InboundMessage;
use std::future::Future;

/// Implementers of the `Handler` trait receive every message consumed by a
/// [`QueueConsumer`](crate::consumers::QueueConsumer): it is the entrypoint of the processing
/// pipeline.
///
/// # Scope
///
/// `handle` does not get access to the underlying RabbitMq channel.
/// Depending on the [`AckMode`](crate::consumers::AckMode), the consumer either acknowledged
/// the message before calling `handle` or acks/rejects it according to the returned outcome.
///
/// # Implementors
///
/// While you can implement `Handler` for a struct or enum, most of the time you will be relying
/// on [`ClosureHandler`] to use an async function with a matching signature -
/// `Fn(InboundMessage) -> Fut`.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError>;
}

/// Implement the [`Handler`] trait for all Boxed handlers.
///
/// E.g. Box<dyn Handler>.
#[async_trait::async_trait]
impl<H> Handler for Box<H>
where
    H: Handler + ?Sized,
{
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError> {
        H::handle(self, message).await
    }
}

/// Wrapper type to turn an async function into a [`Handler`].
///
/// ```rust
/// use carrot_inbound::consumers::{ClosureHandler, HandlerError, InboundMessage};
///
/// async fn print(message: InboundMessage) -> Result<(), HandlerError> {
///     println!("{:?}", message.content);
///     Ok(())
/// }
///
/// let handler = ClosureHandler(print);
/// # drop(handler);
/// ```
pub struct ClosureHandler<F>(pub F);

/// We do not require handlers to return a [`HandlerError`] directly - it is enough for them to
/// return an error type that can be converted to [`HandlerError`]
#[async_trait::async_trait]
impl<F, Fut, Err> Handler for ClosureHandler<F>
where
    F: Fn(InboundMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
    Err: Into<HandlerError> + 'static,
{
    async fn handle(&self, message: InboundMessage) -> Result<(), HandlerError> {
        (self.0)(message).await.map_err(Into::into)
    }
}

/// The error type returned by message handlers: processing of the message failed.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct HandlerError(#[from] anyhow::Error);

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(error.into())
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}
