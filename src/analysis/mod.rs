// file: src/analysis/mod.rs
// description: analysis generation module exports
// reference: internal module structure

pub mod chat;
pub mod generator;
pub mod prompt;

pub use chat::{ChatCompletion, OpenAiChatClient};
pub use generator::{ANALYSIS_ERROR_PREFIX, AnalysisGenerator};
pub use prompt::{AnalysisPrompt, SYSTEM_PROMPT};
