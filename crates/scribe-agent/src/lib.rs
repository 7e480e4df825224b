//! Scribe Agent: the long-form writing loop and its context budget.
//!
//! This crate contains:
//! - **tokens**: token estimation with a character-count fallback
//! - **compressor**: history summarization and recovery snapshots
//! - **tools**: tool trait, registry, and the project/file tools
//! - **agent_loop**: the LLM ↔ tool-calling main loop
//! - **state** / **error**: run state, interrupt flag, and the failure policy

pub mod agent_loop;
pub mod compressor;
pub mod context;
pub mod error;
pub mod state;
pub mod tokens;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent_loop::{AgentLoop, LoopSettings, RunReport};
pub use compressor::{CompressionOutcome, ContextCompressor, SnapshotOutcome};
pub use error::{AgentError, CompressionError, FailureKind, Recovery};
pub use state::{InterruptFlag, RunState, RunStatus};
pub use tokens::TokenEstimator;
pub use tools::{Tool, ToolName, ToolRegistry};
