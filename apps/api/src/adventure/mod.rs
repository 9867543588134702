// Micro-adventure generation.
// Pipeline: validation → prompts → llm_client → normalizer, glued by generator.
// All completion calls go through llm_client::CompletionClient.

pub mod generator;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod prompts;
pub mod validation;
