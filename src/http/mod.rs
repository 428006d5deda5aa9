//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, start/shutdown)
//!     → request.rs (request ID)
//!     → middleware.rs (undecodable encodings, concurrency permit)
//!     → handler.rs (read `method`, dispatch)
//!         preconnect          → redirect host reply
//!         connect             → parser → registry.put → run id reply
//!         span_event_data     → parser → registry.get → translator → consumer
//!         analytic_event_data → parser → log
//!     → response.rs (JSON envelopes, error statuses)
//! ```

pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use handler::AgentMethod;
pub use request::X_REQUEST_ID;
pub use response::RequestError;
pub use server::{AppState, NewRelicReceiver, ReceiverError};
