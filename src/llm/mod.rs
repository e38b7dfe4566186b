//! Hosted LLM response generation.

pub mod client;
pub mod config;

pub use client::{format_context_prompt, GeminiClient, ResponseGenerator};
pub use config::LlmConfig;
