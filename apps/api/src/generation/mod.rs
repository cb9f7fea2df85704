// Generation: entitlement check, prompt building, one completion call, section extraction.
// All provider calls go through llm_client — no direct OpenAI calls here.

pub mod entitlement;
pub mod extractor;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;
