//! Prompt templates for every model call.
//!
//! All builders are pure: caller-supplied fields are substituted verbatim
//! so the model sees exactly what the user typed.

use crate::model::outreach::MessageKind;
use crate::model::user::{StyleProfile, TrainingSample};

pub const STYLE_ANALYST_SYSTEM_PROMPT: &str = "You are a communication style analyst.";

pub const OPPORTUNITY_SYSTEM_PROMPT: &str = "You are an AI that identifies optimal client \
communication opportunities. Always respond with valid JSON.";

pub const STYLE_MIMIC_SYSTEM_PROMPT: &str =
    "You are mimicking a specific professional's communication style.";

const OPPORTUNITY_INSTRUCTIONS: &str = r#"Look for:
1. Upcoming or recent birthdays or anniversaries
2. Health concerns that warrant follow-up
3. Expressed interests that you could comment on (sports, hobbies)
4. Recent life events (moves, job changes, etc.)
5. Seasonal opportunities (holidays, weather events)

For each opportunity, provide:
- The communication trigger
- Suggested timing (immediate, this week, this month)
- Recommended medium (SMS or email)
- The specific detail from notes to reference
- Importance score (1-10 with 10 being highest)

Return your analysis in JSON format as shown below:
{
  "opportunities": [
    {
      "trigger": "trigger_description",
      "timing": "immediate|this_week|this_month",
      "medium": "sms|email",
      "reference": "specific detail to mention",
      "importance": 1-10
    }
  ]
}

If no good opportunities exist, return an empty opportunities array."#;

/// Asks the model to describe how `profession` writes, from sample answers.
pub fn build_style_analysis_prompt(profession: &str, samples: &[TrainingSample]) -> String {
    let mut prompt = format!(
        "Analyze the communication style in these responses from a {profession}.\n\
         Identify patterns in tone, sentence structure, vocabulary, and any distinctive elements.\n\n\
         Responses:\n"
    );

    for (index, sample) in samples.iter().enumerate() {
        prompt.push_str(&format!(
            "\n{}. Question: {}\n   Response: {}\n",
            index + 1,
            sample.question,
            sample.response
        ));
    }

    prompt.push_str(
        "\nProvide a detailed style analysis that can be used to mimic this person's \
         communication style.",
    );
    prompt
}

/// Asks for reasons to contact `customer_name`, answered as JSON.
pub fn build_opportunity_prompt(customer_name: &str, note_text: &str) -> String {
    format!(
        "Analyze these notes about {customer_name} and identify any communication opportunities:\n\n\
         {note_text}\n\n\
         {OPPORTUNITY_INSTRUCTIONS}"
    )
}

/// Asks for a message to `customer_name` written in the user's voice.
///
/// When `reference` is set the prompt insists the detail is mentioned.
pub fn build_styled_message_prompt(
    profile: &StyleProfile,
    customer_name: &str,
    note_text: &str,
    kind: MessageKind,
    reference: Option<&str>,
) -> String {
    let reference_line = reference
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(|detail| format!("\nSpecifically, be sure to reference this detail: {detail}"))
        .unwrap_or_default();

    format!(
        "You are a {profession} with the following communication style:\n\n\
         {style}\n\n\
         You need to write a {kind} to your client/customer named {customer_name}.\n\n\
         Here are your notes about this customer:\n\
         {note_text}\n\
         {reference_line}\n\n\
         Write a personalized {kind} that incorporates information from your notes.\n\
         Keep it natural, friendly, and authentic to your communication style.\n\
         If it's a birthday message, make it appropriate for the occasion.\n\
         If there are health concerns or specific interests mentioned, reference them appropriately.\n\n\
         The message should be concise (appropriate for {kind}) and not explicitly mention that \
         you're using notes.",
        profession = profile.profession,
        style = profile.style_analysis,
    )
}

/// Asks for an answer to an ad hoc client question in the user's voice.
pub fn build_styled_response_prompt(
    profile: &StyleProfile,
    examples: &[TrainingSample],
    question: &str,
) -> String {
    let examples = examples
        .iter()
        .enumerate()
        .map(|(index, sample)| format!("{}. {}", index + 1, sample.response))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a {profession} with the following communication style:\n\n\
         {style}\n\n\
         Here are some examples of how you respond to questions:\n\
         {examples}\n\n\
         Please respond to this question in your typical communication style:\n\
         \"{question}\"",
        profession = profile.profession,
        style = profile.style_analysis,
    )
}
