//! Groq API client for chat completions.
//!
//! Thin HTTP layer over the OpenAI-compatible endpoint. Higher layers own
//! prompt construction, JSON extraction, and fallback behavior.

mod client;
mod types;

pub use client::GroqClient;
pub use types::{ChatRequest, ChatResponse, Choice, ChoiceMessage, Message, MessageRole, Usage};
