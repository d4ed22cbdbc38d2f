//! Command protocol exchanged between client and server.
//!
//! Every TCP connection starts with exactly one `Request` line. Store requests
//! are answered with one `Response` line and the connection is closed. A
//! `SUBSCRIBE` request is acknowledged with `SUBSCRIBED`, after which the
//! server streams `BroadcastMessage` lines until either side disconnects.
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::model::{Company, CompanyId, Quote, QuoteChanges, QuoteId};

/// Client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Insert a new quote.
    Create {
        /// Quote name. Missing is treated as blank.
        #[serde(default)]
        name: String,
        /// Owning company.
        company_id: CompanyId,
    },
    /// Apply `changes` to quote `id`.
    Update {
        /// Target quote.
        id: QuoteId,
        /// Fields to change.
        #[serde(default)]
        changes: QuoteChanges,
    },
    /// Remove quote `id`.
    Delete {
        /// Target quote.
        id: QuoteId,
    },
    /// All quotes, newest first.
    List,
    /// Register a company.
    CreateCompany {
        /// Company name.
        #[serde(default)]
        name: String,
    },
    /// All registered companies.
    Companies,
    /// Turn this connection into a stream of broadcasts on `channel`.
    Subscribe {
        /// Channel name, e.g. `quotes`.
        channel: String,
    },
}

impl Request {
    /// Creates a subscription request.
    pub fn subscribe(channel: &str) -> Self {
        Request::Subscribe {
            channel: String::from(channel),
        }
    }
}

/// Server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// A single committed quote.
    Quote {
        /// The record as committed.
        quote: Quote,
    },
    /// Quote listing, newest first.
    Quotes {
        /// Records.
        quotes: Vec<Quote>,
    },
    /// Delete committed.
    Deleted {
        /// Removed quote.
        id: QuoteId,
    },
    /// A single company.
    Company {
        /// The registered company.
        company: Company,
    },
    /// Company listing.
    Companies {
        /// Records.
        companies: Vec<Company>,
    },
    /// Subscription accepted; broadcast lines follow.
    Subscribed {
        /// Channel joined.
        channel: String,
    },
    /// The request failed.
    Error {
        /// `validation`, `not_found`, `bad_request` or `internal`.
        kind: String,
        /// Human-readable reason.
        message: String,
    },
}

impl Response {
    /// Maps a failure to an `ERROR` response.
    pub fn from_error(err: &QuoteError) -> Self {
        let kind = match err {
            QuoteError::Validation(_) => "validation",
            QuoteError::NotFound(_) => "not_found",
            QuoteError::SerdeJson(_) | QuoteError::Protocol(_) => "bad_request",
            _ => "internal",
        };
        Response::Error {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }

    /// Turns an `ERROR` response back into `QuoteError::Remote`.
    pub fn into_result(self) -> Result<Response, QuoteError> {
        match self {
            Response::Error { kind, message } => Err(QuoteError::Remote { kind, message }),
            other => Ok(other),
        }
    }
}
