//! `carrot-inbound` consumes messages from a single RabbitMq queue, built on top of [`lapin`],
//! and feeds each of them into a processing pipeline.
//!
//! A [`QueueConsumer`](crate::consumers::QueueConsumer) connects to the broker (either through
//! an AMQP URI or structured settings), optionally declares the queue, subscribes to it and
//! dispatches every delivery to a [`Handler`](crate::consumers::Handler) under one of two
//! acknowledgment disciplines:
//!
//! - [`AckMode::AutoAck`](crate::consumers::AckMode::AutoAck): messages are considered consumed
//!   as soon as they are delivered (at-most-once);
//! - [`AckMode::ExplicitAck`](crate::consumers::AckMode::ExplicitAck): messages are acked once
//!   the handler succeeds, rejected without requeueing if it fails.

pub mod amqp;
pub mod consumers;
