//! Error types shared across the core crate.

use thiserror::Error;

use crate::store::StoreError;

/// Failures reported by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A tab, resource or job name was blank.
    #[error("{0} name must not be empty")]
    EmptyInput(&'static str),
    /// The requested name is already taken (or unchanged on rename).
    #[error("{kind} '{name}' already exists")]
    NameConflict {
        /// What kind of entry clashed.
        kind: &'static str,
        /// The conflicting name.
        name: String,
    },
    /// The name collides with the registry record key.
    #[error("'{0}' is a reserved name")]
    ReservedName(String),
    /// No tab with this name is registered.
    #[error("tab '{0}' does not exist")]
    UnknownTab(String),
    /// No resource or product with this name exists in the tab.
    #[error("resource '{0}' does not exist")]
    UnknownResource(String),
    /// No job with this name exists in the tab.
    #[error("job '{0}' does not exist")]
    UnknownJob(String),
    /// A definition breaks a data-model rule.
    #[error("invalid definition for '{name}': {reason}")]
    InvalidDefinition {
        /// Name of the rejected definition.
        name: String,
        /// Rule that was broken.
        reason: String,
    },
    /// Products reference each other in a loop.
    #[error("input cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    /// Text input could not be turned into a definition.
    #[error("cannot parse '{fragment}': {reason}")]
    Parse {
        /// Offending piece of input.
        fragment: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The backing store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl LedgerError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(fragment: &str, reason: impl Into<String>) -> Self {
        LedgerError::Parse {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error came from persistence rather than validation.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }
}
