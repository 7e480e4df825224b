//! LLM provider layer for Scribe.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`]: trait that all providers implement
//! - [`registry`]: static specs for the supported OpenAI-compatible backends
//! - [`http_provider::HttpProvider`]: generic OpenAI-compatible HTTP client
//! - [`http_provider::create_provider`]: convenience builder from model name + config

pub mod error;
pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use error::LlmError;
pub use http_provider::{create_provider, HttpProvider};
pub use registry::{ProviderSpec, PROVIDERS};
pub use traits::{LlmProvider, LlmRequestConfig};
