//!
//! Common types and utilities shared by the quote server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `QuoteError` used across the workspace.
//! - `result` — handy `Result<T, QuoteError>` alias.
//! - `model` — `Quote` and `Company` records and their invariants.
//! - `message` — broadcast payload pushed to channel subscribers.
//! - `command` — request/response payloads of the TCP command protocol.
//! - `net` — networking constants and line framing helpers.
//! - `render` — HTML fragment for a quote list item.
#![warn(missing_docs)]
pub mod command;
pub mod error;
pub mod message;
pub mod model;
pub mod net;
pub mod render;
pub mod result;

pub use command::{Request, Response};
pub use error::{QuoteError, ValidationError};
pub use message::{BroadcastMessage, Insertion, MessageKind};
pub use model::{Company, CompanyId, Quote, QuoteChanges, QuoteId};
pub use result::Result;
