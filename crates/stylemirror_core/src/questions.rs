//! Profession-specific training questions.
//!
//! Each set has exactly `QUESTIONS_PER_SET` prompts written so the answer
//! shows how the professional talks to clients.

pub const QUESTIONS_PER_SET: usize = 5;

const DOCTOR_QUESTIONS: [&str; QUESTIONS_PER_SET] = [
    "A patient messages you saying they have a mild fever and body aches for 2 days. How would you respond?",
    "A patient asks if they should be worried about a new medication's side effects. How would you respond?",
    "Someone wants to know if their lab results are concerning. How would you respond?",
    "A patient asks you to explain a common procedure in your field. How would you respond?",
    "Someone asks for your opinion on a popular health trend. How would you respond?",
];

const THERAPIST_QUESTIONS: [&str; QUESTIONS_PER_SET] = [
    "A client messages you saying they're feeling anxious about a job interview. How would you respond?",
    "Someone tells you they've been feeling unmotivated lately. How would you respond?",
    "A client asks how they can improve their relationship with their partner. How would you respond?",
    "Someone wants to know if their feelings of sadness are normal. How would you respond?",
    "A client asks how many sessions they might need. How would you respond?",
];

const REALTOR_QUESTIONS: [&str; QUESTIONS_PER_SET] = [
    "A potential buyer asks when they can see a property you've listed. How would you respond?",
    "Someone asks if now is a good time to sell their home. How would you respond?",
    "A client asks what they should do to prepare their house for showing. How would you respond?",
    "Someone asks about property values in a specific neighborhood. How would you respond?",
    "A potential client asks why they should work with you instead of another agent. How would you respond?",
];

const DEFAULT_QUESTIONS: [&str; QUESTIONS_PER_SET] = [
    "A client asks when they can schedule an appointment with you. How would you respond?",
    "Someone asks about your rates or fees. How would you respond?",
    "A client wants to know your professional opinion on something. How would you respond?",
    "Someone requests more information about your services. How would you respond?",
    "A potential client asks why they should work with you. How would you respond?",
];

/// Returns the question set for `profession`, falling back to a generic set.
///
/// Matching ignores case and surrounding whitespace.
pub fn questions_for(profession: &str) -> &'static [&'static str] {
    match profession.trim().to_lowercase().as_str() {
        "doctor" => &DOCTOR_QUESTIONS,
        "therapist" => &THERAPIST_QUESTIONS,
        "realtor" => &REALTOR_QUESTIONS,
        _ => &DEFAULT_QUESTIONS,
    }
}
