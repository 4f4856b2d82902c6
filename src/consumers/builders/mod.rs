mod queue_consumer;

pub use queue_consumer::QueueConsumerBuilder;
