//! Conversation data model: transcript, intake step, candidate profile and
//! the running set of technical questions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on technical questions per interview.
pub const MAX_QUESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Stage of the scripted intake, in the order it is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Greeting,
    FullName,
    Email,
    Phone,
    Experience,
    Position,
    Location,
    TechStack,
    Questioning,
}

/// Candidate details gathered during intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Email,
    Phone,
    Experience,
    Position,
    Location,
    TechStack,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Option<String>,
}

impl CandidateProfile {
    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::FullName => &mut self.full_name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Experience => &mut self.experience,
            Field::Position => &mut self.position,
            Field::Location => &mut self.location,
            Field::TechStack => &mut self.tech_stack,
        };
        *slot = Some(value);
    }
}

/// Per-session interview state. Owned by the session and mutated once per
/// user turn by `InterviewEngine::process_turn`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub history: Vec<ChatMessage>,
    pub step: Step,
    pub profile: CandidateProfile,
    pub question_count: u32,
    /// Never serialized: it mirrors the generated questions already in history.
    #[serde(skip)]
    pub asked_questions: HashSet<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            step: Step::Greeting,
            profile: CandidateProfile::default(),
            question_count: 0,
            asked_questions: HashSet::new(),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(ChatMessage::new(role, content));
    }

    pub fn tech_stack(&self) -> &str {
        self.profile.tech_stack.as_deref().unwrap_or_default()
    }

    pub fn questions_remaining(&self) -> u32 {
        MAX_QUESTIONS.saturating_sub(self.question_count)
    }

    pub fn is_complete(&self) -> bool {
        self.step == Step::Questioning && self.question_count >= MAX_QUESTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_at_greeting() {
        let state = ConversationState::new();
        assert_eq!(state.step, Step::Greeting);
        assert!(state.history.is_empty());
        assert_eq!(state.question_count, 0);
        assert_eq!(state.questions_remaining(), MAX_QUESTIONS);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_profile_set_targets_one_field() {
        let mut profile = CandidateProfile::default();
        profile.set(Field::Phone, "+1 555 0100".to_string());
        assert_eq!(profile.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(profile.email, None);
        assert_eq!(profile.full_name, None);
    }

    #[test]
    fn test_step_and_role_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&Step::TechStack).unwrap(),
            "\"tech_stack\""
        );
        assert_eq!(
            serde_json::to_string(&Step::FullName).unwrap(),
            "\"full_name\""
        );
        assert_eq!(serde_json::to_string(&Role::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn test_asked_questions_not_serialized() {
        let mut state = ConversationState::new();
        state.asked_questions.insert("Q1".to_string());
        let value = serde_json::to_value(&state).unwrap();
        assert!(value.get("asked_questions").is_none());
        assert_eq!(value["step"], "greeting");
    }
}
