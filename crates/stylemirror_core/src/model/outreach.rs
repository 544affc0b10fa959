//! Drafted messages and suggested communication opportunities.
//!
//! # Invariants
//! - Opportunity importance is always within `1..=10`.
//! - Every enum has exactly one lowercase storage spelling (`as_str`).
//! - `parse` is lenient on case/whitespace because model output feeds it.

use super::customer::CustomerId;
use super::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type MessageId = i64;
pub type OpportunityId = i64;

pub const IMPORTANCE_MIN: u8 = 1;
pub const IMPORTANCE_MAX: u8 = 10;

/// Delivery channel for a message (also the medium of an opportunity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Sms,
    Email,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sms" | "text" => Some(Self::Sms),
            "email" | "e-mail" => Some(Self::Email),
            _ => None,
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a drafted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Waiting for the user to review.
    Draft,
    /// Queued without review because the user enabled autopilot.
    Autopilot,
    Sent,
    Dismissed,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Autopilot => "autopilot",
            Self::Sent => "sent",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "autopilot" => Some(Self::Autopilot),
            "sent" => Some(Self::Sent),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

/// Suggested urgency of an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Immediate,
    ThisWeek,
    ThisMonth,
}

impl Timing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
        }
    }

    /// Accepts `this_week`, `this week` and `this-week` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "immediate" | "immediately" => Some(Self::Immediate),
            "this_week" => Some(Self::ThisWeek),
            "this_month" => Some(Self::ThisMonth),
            _ => None,
        }
    }
}

impl Display for Timing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    Pending,
    Processed,
    Dismissed,
}

impl OpportunityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processed" => Some(Self::Processed),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub customer_id: CustomerId,
    pub content: String,
    /// Serialized as `type` to match the storage column.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub status: MessageStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub customer_id: CustomerId,
    pub content: String,
    pub kind: MessageKind,
    pub status: MessageStatus,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationOpportunity {
    pub id: OpportunityId,
    pub customer_id: CustomerId,
    pub trigger: String,
    pub timing: Timing,
    pub medium: MessageKind,
    /// Specific detail from the notes the message should mention.
    pub reference: String,
    pub importance: u8,
    pub status: OpportunityStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOpportunity {
    pub customer_id: CustomerId,
    pub trigger: String,
    pub timing: Timing,
    pub medium: MessageKind,
    pub reference: String,
    pub importance: u8,
    pub status: OpportunityStatus,
}

impl NewOpportunity {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("trigger", &self.trigger)?;
        validate_importance(i64::from(self.importance))?;
        Ok(())
    }
}

/// Checks an importance score and narrows it to `u8`.
pub fn validate_importance(value: i64) -> Result<u8, ModelValidationError> {
    if value < i64::from(IMPORTANCE_MIN) || value > i64::from(IMPORTANCE_MAX) {
        return Err(ModelValidationError::ImportanceOutOfRange(value));
    }
    u8::try_from(value).map_err(|_| ModelValidationError::ImportanceOutOfRange(value))
}
