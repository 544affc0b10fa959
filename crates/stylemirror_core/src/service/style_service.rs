//! Style training and styled answers.
//!
//! # Invariants
//! - `train` stores samples and analysis only after the model answered.
//! - Retraining replaces earlier samples; `respond` only sees the latest run.
//! - `respond` requires a stored style analysis.

use crate::ai::{analyze_style, generate_styled_response, ChatModel, GenerationSettings};
use crate::model::user::{NewUser, TrainingSample, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Use-case service for learning and reproducing a user's voice.
pub struct StyleService<R: UserRepository, M: ChatModel> {
    repo: R,
    model: M,
    settings: GenerationSettings,
}

impl<R: UserRepository, M: ChatModel> StyleService<R, M> {
    pub fn new(repo: R, model: M, settings: GenerationSettings) -> Self {
        Self {
            repo,
            model,
            settings,
        }
    }

    /// Creates a user and returns the stored row.
    pub fn register_user(&self, name: &str, profession: &str) -> ServiceResult<User> {
        let user_id = self.repo.create_user(&NewUser::new(name, profession))?;
        info!("event=user_register module=service status=ok user_id={user_id}");
        self.repo
            .get_user(user_id)?
            .ok_or(ServiceError::InconsistentState(
                "created user not found in read-back",
            ))
    }

    pub fn get_user(&self, user_id: UserId) -> ServiceResult<User> {
        self.load_user(user_id)
    }

    /// Analyzes the samples, then replaces the user's stored samples and
    /// analysis with this run.
    ///
    /// Returns the style analysis text.
    pub fn train(&self, user_id: UserId, samples: &[TrainingSample]) -> ServiceResult<String> {
        if samples.is_empty() {
            return Err(ServiceError::InvalidInput(
                "at least one training sample is required",
            ));
        }
        for sample in samples {
            sample.validate().map_err(|_| {
                ServiceError::InvalidInput("training samples need a question and a response")
            })?;
        }

        let user = self.load_user(user_id)?;
        let analysis = analyze_style(&self.model, &self.settings, &user.profession, samples)?;

        self.repo
            .replace_training_responses(user_id, samples, &analysis)?;
        info!(
            "event=style_train module=service status=ok user_id={user_id} samples={} analysis_chars={}",
            samples.len(),
            analysis.chars().count()
        );
        Ok(analysis)
    }

    /// Answers a client question the way the trained user would.
    pub fn respond(&self, user_id: UserId, question: &str) -> ServiceResult<String> {
        if question.trim().is_empty() {
            return Err(ServiceError::InvalidInput("question must not be blank"));
        }

        let user = self.load_user(user_id)?;
        let profile = user
            .style_profile()
            .ok_or(ServiceError::NotTrained(user_id))?;
        let examples: Vec<TrainingSample> = self
            .repo
            .list_training_responses(user_id)?
            .iter()
            .map(|response| response.to_sample())
            .collect();

        let answer = generate_styled_response(
            &self.model,
            &self.settings,
            &profile,
            &examples,
            question.trim(),
        )?;
        info!(
            "event=style_respond module=service status=ok user_id={user_id} examples={}",
            examples.len()
        );
        Ok(answer)
    }

    pub fn set_autopilot(&self, user_id: UserId, enabled: bool) -> ServiceResult<()> {
        self.repo.set_autopilot(user_id, enabled)?;
        info!("event=autopilot_set module=service status=ok user_id={user_id} enabled={enabled}");
        Ok(())
    }

    fn load_user(&self, user_id: UserId) -> ServiceResult<User> {
        self.repo.get_user(user_id)?.ok_or(ServiceError::NotFound {
            entity: "user",
            id: user_id,
        })
    }
}
