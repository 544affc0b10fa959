//! Chat-model integration: prompt templates, the model seam and the
//! style/outreach operations built on top of them.
//!
//! # Responsibility
//! - Build every prompt sent to the model (`prompts`).
//! - Define the `ChatModel` seam and its HTTP implementation (`chat`).
//! - Run one model call per operation and shape the reply (`analysis`).
//!
//! # Invariants
//! - Every operation issues exactly one chat completion.
//! - Prompt text and replies are never logged verbatim; diagnostics carry
//!   sizes, durations and a sanitized preview at most.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod analysis;
pub mod chat;
pub mod prompts;

pub use analysis::{
    analyze_customer_notes, analyze_style, generate_styled_message, generate_styled_response,
    parse_opportunity_report, OpportunityReport, OpportunitySuggestion,
};
pub use chat::{
    ChatMessage, ChatModel, ChatRequest, ChatRole, GenerationSettings, OpenAiChatClient,
};

pub type AiResult<T> = Result<T, AiError>;

/// Failure talking to the chat-completion endpoint.
#[derive(Debug)]
pub enum AiError {
    /// Transport, TLS, timeout or body decoding failure.
    Http(reqwest::Error),
    /// Endpoint answered with a non-success status.
    Status { status: u16, body: String },
    /// Endpoint answered without any message content.
    EmptyResponse,
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "chat request failed: {err}"),
            Self::Status { status, body } => {
                write!(f, "chat endpoint returned status {status}: {body}")
            }
            Self::EmptyResponse => write!(f, "chat endpoint returned no message content"),
        }
    }
}

impl Error for AiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Status { .. } | Self::EmptyResponse => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
