pub mod generation;
pub mod llm_provider;
pub mod prompts;
