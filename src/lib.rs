//! New Relic agent receiver.
//!
//! Accepts the New Relic agent HTTP protocol (`preconnect`, `connect`,
//! `span_event_data`, `analytic_event_data`) and turns span events into OTLP
//! `ResourceSpans` handed to a pluggable [`TraceConsumer`].

// Wire protocol and translation
pub mod protocol;
pub mod registry;
pub mod translate;

// Serving
pub mod consumer;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ReceiverConfig;
pub use consumer::{ChannelConsumer, ConsumeError, LoggingConsumer, TraceConsumer};
pub use http::{NewRelicReceiver, ReceiverError};
pub use registry::ConnectionRegistry;
