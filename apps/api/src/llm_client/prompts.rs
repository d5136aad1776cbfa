// Shared prompt fragments used across every backend.
// Interview-specific prompts live in interview/prompts.rs.

/// System prompt sent with every completion.
pub const INTERVIEWER_SYSTEM: &str = "You are an AI interviewer.";
