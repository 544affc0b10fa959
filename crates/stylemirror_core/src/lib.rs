//! Core logic for StyleMirror: learn a professional's writing voice and
//! draft client outreach in it.
//! This crate owns storage, prompts and model access; the CLI only drives it.

pub mod ai;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod questions;
pub mod repo;
pub mod service;

pub use ai::{
    AiError, ChatMessage, ChatModel, ChatRequest, ChatRole, GenerationSettings,
    OpenAiChatClient, OpportunityReport, OpportunitySuggestion,
};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{Customer, CustomerId, CustomerNote, NewCustomer};
pub use model::outreach::{
    CommunicationOpportunity, Message, MessageKind, MessageStatus, OpportunityStatus, Timing,
};
pub use model::user::{StyleProfile, TrainingSample, User, UserId};
pub use model::ModelValidationError;
pub use questions::questions_for;
pub use repo::customer_repo::{CustomerRepository, SqliteCustomerRepository};
pub use repo::outreach_repo::{OpportunityListQuery, OutreachRepository, SqliteOutreachRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::outreach_service::OutreachService;
pub use service::style_service::StyleService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
