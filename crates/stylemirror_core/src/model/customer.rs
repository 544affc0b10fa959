//! Clients of a user and the free-form notes kept about them.

use super::user::UserId;
use super::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type CustomerId = i64;
pub type NoteId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: UserId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: i64,
}

/// Insert draft for a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub user_id: UserId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewCustomer {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            phone: None,
            email: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerNote {
    pub id: NoteId,
    pub customer_id: CustomerId,
    pub content: String,
    pub created_at: i64,
}

/// Joins note bodies the way every prompt expects them: one per line.
pub fn join_note_contents(notes: &[CustomerNote]) -> String {
    notes
        .iter()
        .map(|note| note.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
