//! Quote and Company records.
//!
//! A `Quote` always belongs to exactly one `Company` and always has a
//! non-blank name. Identities are plain monotonically assigned integers,
//! wrapped so the two kinds of id cannot be swapped by accident.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identity of a `Quote`. Also its default sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub u64);

/// Identity of a `Company`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u64);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner of quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Store-assigned identity.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
}

/// A committed quote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Store-assigned identity, never reused.
    pub id: QuoteId,
    /// Non-blank display name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// Commit time of the create.
    pub created_at: DateTime<Utc>,
    /// Commit time of the latest write.
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// DOM id subscribers use to locate this quote's node, e.g. `quote_7`.
    pub fn dom_id(&self) -> String {
        dom_id(self.id)
    }
}

/// DOM id for a quote identity.
pub fn dom_id(id: QuoteId) -> String {
    format!("quote_{}", id)
}

/// Partial update of a quote. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteChanges {
    /// New name, validated for presence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New owning company, validated for existence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
}

/// Checks the presence rule and returns the name trimmed of surrounding whitespace.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}
