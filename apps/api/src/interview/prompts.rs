// Scripted lines and the question-generation prompt for the interview.

use super::state::{Field, Step};

pub const TITLE: &str = "TalentScout Hiring Assistant";

pub const WELCOME: &str =
    "Welcome to TalentScout! I'm here to guide you through the initial screening process.";

/// Shown when a session opens; the first answer is the candidate's name.
pub const OPENING_PROMPT: &str = "Hello! Let's start. What's your full name?";

pub const EXIT_KEYWORDS: [&str; 4] = ["exit", "quit", "stop", "end"];

pub const EXIT_MESSAGE: &str = "Thank you for your time! We will get back to you.";

pub const INTERVIEW_START: &str =
    "Great! Let's begin the technical interview. Here's your first question:";

pub const INTERVIEW_COMPLETE: &str = "That's all for the interview! Thank you for your time.";

pub const MODEL_UNAVAILABLE_WARNING: &str =
    "API key is missing or model not supported. Please check your environment variables.";

/// Fixed intake transition for `step`: the field the answer fills, the line
/// asking for the next detail, and the step that follows.
///
/// `None` for `TechStack` and `Questioning`, which hand off to the model.
pub fn intake_transition(step: Step) -> Option<(Field, &'static str, Step)> {
    match step {
        Step::Greeting | Step::FullName => Some((
            Field::FullName,
            "Thanks! Now, please provide your email address.",
            Step::Email,
        )),
        Step::Email => Some((
            Field::Email,
            "Got it! Your phone number next, please.",
            Step::Phone,
        )),
        Step::Phone => Some((
            Field::Phone,
            "How many years of experience do you have?",
            Step::Experience,
        )),
        Step::Experience => Some((
            Field::Experience,
            "What position are you applying for?",
            Step::Position,
        )),
        Step::Position => Some((
            Field::Position,
            "Where are you currently located?",
            Step::Location,
        )),
        Step::Location => Some((
            Field::Location,
            "Finally, list your tech stack (e.g., Python, Django, SQL).",
            Step::TechStack,
        )),
        Step::TechStack | Step::Questioning => None,
    }
}

/// Prompt asking for exactly one new question about `tech_stack`.
pub fn question_prompt<'a>(tech_stack: &str, asked: impl Iterator<Item = &'a String>) -> String {
    let mut asked: Vec<&str> = asked.map(String::as_str).collect();
    asked.sort_unstable();

    let mut prompt = format!(
        "The candidate's tech stack is: {tech_stack}.\n\
        Generate **one unique technical interview question** based on the tech stack.\n\
        Do NOT repeat previously asked questions.\n\
        Do NOT include explanations, only the question itself."
    );

    if !asked.is_empty() {
        prompt.push_str("\n\nQuestions already asked:\n");
        for question in asked {
            prompt.push_str("- ");
            prompt.push_str(question);
            prompt.push('\n');
        }
    }

    prompt
}

/// Deterministic stand-in used when the model keeps repeating itself.
/// The question number keeps it distinct from earlier fallbacks.
pub fn fallback_question(number: u32, tech_stack: &str) -> String {
    format!(
        "Question {number}: Describe a challenging problem you solved using {tech_stack}, \
        and explain how you approached it."
    )
}

pub fn model_error_apology(error: &str) -> String {
    format!("❗ An error occurred with the AI model: {error}. Please try another model.")
}
