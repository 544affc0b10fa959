//! Professional user profile and style training samples.
//!
//! # Invariants
//! - `name` and `profession` are never blank.
//! - `style_analysis` stays `None` until a training run completes.

use super::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type TrainingResponseId = i64;

/// Persisted professional whose voice is being mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Free-form profession, e.g. `doctor` or `realtor`.
    pub profession: String,
    /// Model-produced description of the user's writing style.
    pub style_analysis: Option<String>,
    /// When set, drafted messages are stored as `autopilot` instead of `draft`.
    pub autopilot_enabled: bool,
    pub created_at: i64,
}

impl User {
    /// Returns the style profile used by generation prompts, if trained.
    pub fn style_profile(&self) -> Option<StyleProfile> {
        self.style_analysis.as_ref().map(|analysis| StyleProfile {
            profession: self.profession.clone(),
            style_analysis: analysis.clone(),
        })
    }
}

/// Insert draft for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub profession: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, profession: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profession: profession.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("name", &self.name)?;
        require_text("profession", &self.profession)
    }
}

/// One question/answer pair written by the user in their own voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub question: String,
    pub response: String,
}

impl TrainingSample {
    pub fn new(question: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            response: response.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("question", &self.question)?;
        require_text("response", &self.response)
    }
}

/// Persisted training sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub id: TrainingResponseId,
    pub user_id: UserId,
    pub question: String,
    pub response: String,
    pub created_at: i64,
}

impl TrainingResponse {
    pub fn to_sample(&self) -> TrainingSample {
        TrainingSample::new(self.question.clone(), self.response.clone())
    }
}

/// Prompt-facing view of a trained user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProfile {
    pub profession: String,
    pub style_analysis: String,
}
