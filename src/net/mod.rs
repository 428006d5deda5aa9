//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig.bind_address
//!     → listener.rs (parse address, bind socket)
//!     → TcpListener handed to the HTTP server
//! ```
//!
//! # Design Decisions
//! - Bind failures are startup failures, reported as `TransportError`
//! - Concurrency limits live in the HTTP middleware, not the accept loop

pub mod listener;

pub use listener::{bind, TransportError};
