//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and model calls into use-case APIs.
//! - Keep the CLI decoupled from storage and prompt details.
//!
//! # Invariants
//! - A model call happens before the writes that depend on its output, so a
//!   failed call leaves storage untouched.

use crate::ai::AiError;
use crate::model::user::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod outreach_service;
pub mod style_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Caller input rejected before any side effect.
    InvalidInput(&'static str),
    NotFound { entity: &'static str, id: i64 },
    /// Generation requested for a user without a style analysis.
    NotTrained(UserId),
    Repo(RepoError),
    Ai(AiError),
    /// Write succeeded but read-back did not return the row.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(details) => write!(f, "invalid input: {details}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::NotTrained(user_id) => {
                write!(f, "user {user_id} has no style analysis yet; train first")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::Ai(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Ai(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<AiError> for ServiceError {
    fn from(value: AiError) -> Self {
        Self::Ai(value)
    }
}
