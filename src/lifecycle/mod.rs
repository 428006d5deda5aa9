//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (http/server.rs):
//!     Bind listener → spawn server task → traffic accepted
//!
//! Shutdown (shutdown.rs):
//!     trigger() → server stops accepting → in-flight requests drain → task exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary calls NewRelicReceiver::shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown has a deadline: the server task is aborted once it passes

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
