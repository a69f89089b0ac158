// Generated resumes: prompt, producer, metadata index and HTTP handlers.
// All model calls go through llm_client::TextGenerator.

pub mod generator;
pub mod handlers;
pub mod index;
pub mod prompts;
