//! New Relic agent wire protocol.
//!
//! # Data Flow
//! ```text
//! raw request body (bytes)
//!     → parser.rs (positional JSON → typed records, arity/type checks)
//!     → payload.rs (ConnectionRecord, SpanEventBatch, TransactionEventBatch)
//!     → handed to the registry / translator
//! ```
//!
//! # Design Decisions
//! - The agent sends positional arrays (`[run_id, info, [[fields, user, agent], ...]]`),
//!   never objects; the raw `serde_json::Value` tree does not leave the parser
//! - Fail on the first structural mismatch, naming the position that failed
//! - Identifier syntax is checked by the translator, not the parser

pub mod error;
pub mod parser;
pub mod payload;

pub use error::{ParseError, ValidationError};
pub use parser::{parse_connection_data, parse_span_event_batch, parse_transaction_event_batch};
pub use payload::{
    AttributeValue, Attributes, ConnectionRecord, Event, EventBatch, EventBatchInfo, ParsedSpan,
    ParsedTransaction, Span, SpanEventBatch, Transaction, TransactionEventBatch,
};
