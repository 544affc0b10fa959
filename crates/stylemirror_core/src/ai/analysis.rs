//! Style analysis, opportunity extraction and styled generation.
//!
//! # Responsibility
//! - Pair each prompt builder with its system prompt and run one completion.
//! - Turn the opportunity reply into typed suggestions.
//!
//! # Invariants
//! - Malformed opportunity JSON never fails the call: it yields an empty
//!   report and a `warn` diagnostic.
//! - Individually invalid opportunity entries are dropped, valid siblings kept.
//! - Transport and endpoint failures always propagate as `AiError`.

use crate::ai::chat::{ChatModel, ChatRequest, GenerationSettings};
use crate::ai::prompts::{
    build_opportunity_prompt, build_style_analysis_prompt, build_styled_message_prompt,
    build_styled_response_prompt, OPPORTUNITY_SYSTEM_PROMPT, STYLE_ANALYST_SYSTEM_PROMPT,
    STYLE_MIMIC_SYSTEM_PROMPT,
};
use crate::ai::AiResult;
use crate::logging::sanitize_message;
use crate::model::customer::{join_note_contents, CustomerNote};
use crate::model::outreach::{validate_importance, MessageKind, Timing};
use crate::model::user::{StyleProfile, TrainingSample};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_REPLY_PREVIEW_CHARS: usize = 160;

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").expect("valid fence regex")
});

/// One suggested reason to contact a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunitySuggestion {
    pub trigger: String,
    pub timing: Timing,
    pub medium: MessageKind,
    pub reference: String,
    pub importance: u8,
}

/// Typed form of the `{"opportunities": [...]}` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityReport {
    pub opportunities: Vec<OpportunitySuggestion>,
}

impl OpportunityReport {
    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    opportunities: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawOpportunity {
    trigger: String,
    timing: String,
    medium: String,
    #[serde(default)]
    reference: String,
    importance: Value,
}

/// Produces a free-text description of how the samples are written.
pub fn analyze_style<M: ChatModel + ?Sized>(
    model: &M,
    settings: &GenerationSettings,
    profession: &str,
    samples: &[TrainingSample],
) -> AiResult<String> {
    let request = ChatRequest::new(
        settings,
        STYLE_ANALYST_SYSTEM_PROMPT,
        build_style_analysis_prompt(profession, samples),
    );
    model.complete(&request)
}

/// Extracts communication opportunities from the notes about a customer.
pub fn analyze_customer_notes<M: ChatModel + ?Sized>(
    model: &M,
    settings: &GenerationSettings,
    customer_name: &str,
    notes: &[CustomerNote],
) -> AiResult<OpportunityReport> {
    let request = ChatRequest::new(
        settings,
        OPPORTUNITY_SYSTEM_PROMPT,
        build_opportunity_prompt(customer_name, &join_note_contents(notes)),
    );
    let reply = model.complete(&request)?;
    Ok(parse_opportunity_report(&reply))
}

/// Drafts a message to a customer in the user's voice.
pub fn generate_styled_message<M: ChatModel + ?Sized>(
    model: &M,
    settings: &GenerationSettings,
    profile: &StyleProfile,
    customer_name: &str,
    notes: &[CustomerNote],
    kind: MessageKind,
    reference: Option<&str>,
) -> AiResult<String> {
    let request = ChatRequest::new(
        settings,
        STYLE_MIMIC_SYSTEM_PROMPT,
        build_styled_message_prompt(
            profile,
            customer_name,
            &join_note_contents(notes),
            kind,
            reference,
        ),
    );
    model.complete(&request)
}

/// Answers an ad hoc client question in the user's voice.
pub fn generate_styled_response<M: ChatModel + ?Sized>(
    model: &M,
    settings: &GenerationSettings,
    profile: &StyleProfile,
    examples: &[TrainingSample],
    question: &str,
) -> AiResult<String> {
    let request = ChatRequest::new(
        settings,
        STYLE_MIMIC_SYSTEM_PROMPT,
        build_styled_response_prompt(profile, examples, question),
    );
    model.complete(&request)
}

/// Parses an opportunity reply, degrading to an empty report.
///
/// A reply wrapped in a markdown code fence is unwrapped first.
pub fn parse_opportunity_report(reply: &str) -> OpportunityReport {
    let body = strip_code_fence(reply);
    let raw: RawReport = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(
                "event=opportunity_parse module=ai status=degraded error_code=invalid_json error={} reply_preview={}",
                err,
                sanitize_message(reply, MAX_REPLY_PREVIEW_CHARS)
            );
            return OpportunityReport::default();
        }
    };

    let total = raw.opportunities.len();
    let opportunities: Vec<OpportunitySuggestion> = raw
        .opportunities
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match convert_entry(entry) {
            Ok(suggestion) => Some(suggestion),
            Err(reason) => {
                warn!(
                    "event=opportunity_parse module=ai status=skipped index={index} reason={reason}"
                );
                None
            }
        })
        .collect();

    debug!(
        "event=opportunity_parse module=ai status=ok total={total} kept={}",
        opportunities.len()
    );
    OpportunityReport { opportunities }
}

fn strip_code_fence(reply: &str) -> &str {
    CODE_FENCE_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map_or(reply.trim(), |body| body.as_str().trim())
}

fn convert_entry(entry: Value) -> Result<OpportunitySuggestion, String> {
    let raw: RawOpportunity =
        serde_json::from_value(entry).map_err(|err| format!("bad_shape:{err}"))?;

    let trigger = raw.trigger.trim().to_string();
    if trigger.is_empty() {
        return Err("blank_trigger".to_string());
    }
    let timing =
        Timing::parse(&raw.timing).ok_or_else(|| format!("unknown_timing:{}", raw.timing))?;
    let medium =
        MessageKind::parse(&raw.medium).ok_or_else(|| format!("unknown_medium:{}", raw.medium))?;
    let importance = importance_from_value(&raw.importance)
        .ok_or_else(|| format!("bad_importance:{}", raw.importance))?;

    Ok(OpportunitySuggestion {
        trigger,
        timing,
        medium,
        reference: raw.reference.trim().to_string(),
        importance,
    })
}

/// Accepts `8`, `8.0` and `"8"`; rejects anything outside `1..=10`.
fn importance_from_value(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64))?,
        Value::String(text) => text.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    validate_importance(number).ok()
}
