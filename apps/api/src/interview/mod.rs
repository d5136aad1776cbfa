// Interview: scripted candidate intake followed by model-generated
// technical questions. All model calls go through llm_client.

pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod session;
pub mod state;
