//! Error types shared between client and server.
//!
//! `QuoteError` unifies domain failures (validation, missing records) with the
//! transport failures of the command protocol (I/O, JSON, lock poisoning), so
//! every crate in the workspace can propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::model::{CompanyId, QuoteId};

/// A write rejected before it reached the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `name` was empty, whitespace-only or missing.
    #[error("name can't be blank")]
    BlankName,

    /// `company_id` does not reference a registered company.
    #[error("company {0} does not exist")]
    UnknownCompany(CompanyId),
}

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The write violates a model invariant; nothing was committed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Update or delete targeted a quote that does not exist.
    #[error("Quote not found: {0}")]
    NotFound(QuoteId),

    /// I/O error originating from sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The peer sent something the protocol does not allow at this point.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered a request with an error response.
    #[error("Server error ({kind}): {message}")]
    Remote {
        /// Error class reported by the server.
        kind: String,
        /// Human-readable message reported by the server.
        message: String,
    },

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl<T> From<PoisonError<T>> for QuoteError {
    fn from(err: PoisonError<T>) -> Self {
        QuoteError::MutexLock(err.to_string())
    }
}
