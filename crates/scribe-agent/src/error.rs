//! Agent errors and the failure policy table.
//!
//! Every risky step of the loop (estimate, compress, model call, tool
//! execution) returns a typed error; `FailureKind::recovery` decides what the
//! loop does about it. There is exactly one place that maps failure to action.

use std::path::PathBuf;

use scribe_providers::LlmError;
use thiserror::Error;

/// Failures of the context compressor.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The summarization call itself failed.
    #[error("summarization request failed: {0}")]
    Summarize(#[from] LlmError),

    /// The model answered but with no text.
    #[error("summarization returned no text")]
    EmptySummary,

    #[error("failed to write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can go wrong inside one loop iteration.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    ModelCall(#[from] LlmError),

    #[error("context compression failed: {0}")]
    Compression(#[from] CompressionError),

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{tool} failed: {reason}")]
    ToolExecution { tool: String, reason: String },
}

impl AgentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AgentError::ModelCall(_) => FailureKind::ModelCall,
            AgentError::Compression(_) => FailureKind::Compression,
            AgentError::UnknownTool(_) => FailureKind::UnknownTool,
            AgentError::InvalidArguments { .. } => FailureKind::InvalidArguments,
            AgentError::ToolExecution { .. } => FailureKind::ToolExecution,
        }
    }

    /// Text placed in a `tool` result when the failure is reported to the model.
    pub fn to_tool_result(&self) -> String {
        format!("Error: {self}")
    }
}

/// Failure categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Tokenizer unavailable; handled inside the estimator.
    Estimation,
    Compression,
    ModelCall,
    UnknownTool,
    InvalidArguments,
    ToolExecution,
    /// Missing credential, unreadable recovery file.
    Startup,
}

/// What the loop does about a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Abandon this iteration; the next pass tries again.
    RetryNextIteration,
    /// Log and carry on with the iteration as if the step had not run.
    SkipAndContinue,
    /// Surface the error text to the model as the tool result.
    ReportToModel,
    /// Stop the process before the loop starts.
    Fatal,
}

impl FailureKind {
    pub const fn recovery(self) -> Recovery {
        match self {
            FailureKind::Estimation | FailureKind::Compression => Recovery::SkipAndContinue,
            FailureKind::ModelCall => Recovery::RetryNextIteration,
            FailureKind::UnknownTool
            | FailureKind::InvalidArguments
            | FailureKind::ToolExecution => Recovery::ReportToModel,
            FailureKind::Startup => Recovery::Fatal,
        }
    }
}
