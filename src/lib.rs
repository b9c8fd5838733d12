//! Message-driven crawl-and-analyze pipeline workers.
//!
//! Independent worker processes consume work items from named queues on a
//! RabbitMQ broker, perform one unit of work (measure a file, run an external
//! analysis tool), persist results, and optionally publish follow-up messages
//! that trigger the next pipeline stage. Seed commands publish the initial
//! message of a chain.
//!
//! The broker topology is described once in [`messaging::topology`];
//! the shared consumer lifecycle lives in [`consumer::ConsumerRuntime`].

pub mod app;
pub mod config;
pub mod consumer;
pub mod executor;
pub mod messaging;
pub mod metrics;
pub mod model;
pub mod producer;
pub mod shutdown;
pub mod store;
