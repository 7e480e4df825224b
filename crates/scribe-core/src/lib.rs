//! Scribe Core: shared message types, configuration, and utilities.
//!
//! - **types**: OpenAI-format messages, tool calls, tool definitions, LLM responses
//! - **config**: `~/.scribe/config.json` schema and loader with env overrides
//! - **utils**: data paths, timestamps, string helpers

pub mod config;
pub mod types;
pub mod utils;

pub use types::{LlmResponse, Message, ToolCall, ToolDefinition};
