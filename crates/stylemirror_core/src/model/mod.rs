//! Domain model for users, their clients and outreach artifacts.
//!
//! # Responsibility
//! - Define the records persisted by the repositories.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Ids are SQLite row ids assigned on insert; drafts (`New*`) carry none.
//! - `created_at` is epoch milliseconds assigned by storage.
//! - Enum-typed columns round-trip through `as_str`/`parse` only.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod customer;
pub mod outreach;
pub mod user;

/// Validation failure raised before any SQL mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required text field is empty or whitespace-only.
    BlankField(&'static str),
    /// Opportunity importance outside `1..=10`.
    ImportanceOutOfRange(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::ImportanceOutOfRange(value) => {
                write!(f, "importance must be within 1..=10, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_text, ModelValidationError};

    #[test]
    fn require_text_rejects_whitespace() {
        assert_eq!(
            require_text("name", " \n\t"),
            Err(ModelValidationError::BlankField("name"))
        );
        assert!(require_text("name", "Dana").is_ok());
    }
}
