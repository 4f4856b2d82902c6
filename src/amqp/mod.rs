//! Helpers for connecting to a RabbitMq broker.

pub mod configuration;
mod error;
mod factory;
pub mod transport;

pub use error::ConnectionError;
pub use factory::ConnectionFactory;
pub use transport::LapinTransport;

pub use lapin::{options, types};
