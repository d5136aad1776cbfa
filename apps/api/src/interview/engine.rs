//! Interview state machine.
//!
//! Flow per user turn: exit check → record user line → intake transition or
//! question generation → record ai line. Every turn ends with exactly one
//! new ai entry; the exit path records no user entry.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::interview::prompts::{
    fallback_question, intake_transition, model_error_apology, question_prompt, EXIT_KEYWORDS,
    EXIT_MESSAGE, INTERVIEW_COMPLETE, INTERVIEW_START,
};
use crate::interview::state::{ConversationState, Field, Role, Step, MAX_QUESTIONS};
use crate::llm_client::prompts::INTERVIEWER_SYSTEM;
use crate::llm_client::{ChatModel, LlmError};

/// Drives one session's interview against the model chosen for it.
pub struct InterviewEngine {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
}

pub fn is_exit_keyword(message: &str) -> bool {
    let message = message.trim();
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(message))
}

impl InterviewEngine {
    /// `max_attempts` is clamped to at least one completion per question.
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32) -> Self {
        Self {
            model,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Consumes one user message and returns the ai reply appended to history.
    pub async fn process_turn(&self, state: &mut ConversationState, message: &str) -> String {
        if is_exit_keyword(message) {
            info!("Candidate ended the session at step {:?}", state.step);
            state.push(Role::Ai, EXIT_MESSAGE);
            return EXIT_MESSAGE.to_string();
        }

        state.push(Role::User, message);

        let reply = match self.advance(state, message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("AI error from {}: {e}", self.model_name());
                model_error_apology(&e.to_string())
            }
        };

        state.push(Role::Ai, reply.clone());
        reply
    }

    async fn advance(
        &self,
        state: &mut ConversationState,
        message: &str,
    ) -> Result<String, LlmError> {
        if let Some((field, next_prompt, next_step)) = intake_transition(state.step) {
            state.profile.set(field, message.to_string());
            state.step = next_step;
            return Ok(next_prompt.to_string());
        }

        if state.step == Step::TechStack {
            state.profile.set(Field::TechStack, message.to_string());
            state.step = Step::Questioning;
            info!("Intake complete, starting technical questions");
            let question = self.generate_next_question(state).await?;
            return Ok(format!("{INTERVIEW_START}\n\n{question}"));
        }

        self.generate_next_question(state).await
    }

    /// Produces the next technical question, distinct from every one asked so
    /// far, and counts it. Returns the closing line once the limit is reached.
    ///
    /// Empty or repeated completions are retried up to `max_attempts` times;
    /// after that a numbered fallback question is recorded instead.
    pub async fn generate_next_question(
        &self,
        state: &mut ConversationState,
    ) -> Result<String, LlmError> {
        if state.question_count >= MAX_QUESTIONS {
            return Ok(INTERVIEW_COMPLETE.to_string());
        }

        let tech_stack = state.tech_stack().to_string();
        let prompt = question_prompt(&tech_stack, state.asked_questions.iter());

        for attempt in 1..=self.max_attempts {
            let candidate = match self.model.complete(INTERVIEWER_SYSTEM, &prompt).await {
                Ok(text) => text,
                Err(LlmError::EmptyContent) => String::new(),
                Err(e) => return Err(e),
            };
            let candidate = candidate.trim();

            if candidate.is_empty() || state.asked_questions.contains(candidate) {
                warn!(
                    "Question attempt {}/{} rejected as empty or already asked",
                    attempt, self.max_attempts
                );
                continue;
            }

            return Ok(record_question(state, candidate.to_string()));
        }

        warn!(
            "No unique question after {} attempts, using fallback",
            self.max_attempts
        );
        let mut number = state.question_count + 1;
        let mut fallback = fallback_question(number, &tech_stack);
        while state.asked_questions.contains(&fallback) {
            number += 1;
            fallback = fallback_question(number, &tech_stack);
        }
        Ok(record_question(state, fallback))
    }
}

fn record_question(state: &mut ConversationState, question: String) -> String {
    state.asked_questions.insert(question.clone());
    state.question_count += 1;
    info!(
        "Asked technical question {}/{}",
        state.question_count, MAX_QUESTIONS
    );
    question
}
