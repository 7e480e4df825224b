//! Tool trait and the closed set of tool names.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use scribe_core::types::ToolDefinition;
use serde_json::Value;

use crate::error::AgentError;
use crate::state::RunState;

// ─────────────────────────────────────────────
// ToolName
// ─────────────────────────────────────────────

/// Every action the model may request. Names outside this set are rejected
/// at parse time, before any lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateProject,
    WriteFile,
    /// Declared to the model but handled by the loop itself.
    CompressContext,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::CreateProject,
        ToolName::WriteFile,
        ToolName::CompressContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateProject => "create_project",
            ToolName::WriteFile => "write_file",
            ToolName::CompressContext => "compress_context",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| AgentError::UnknownTool(s.to_string()))
    }
}

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// A handler the registry can dispatch to.
///
/// Handlers read and update the per-run state (the active project) instead of
/// holding it themselves, so one registry can serve several runs.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;

    /// Human-readable description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema for the parameters.
    fn parameters(&self) -> Value;

    /// Run the tool. An `Err` is reported to the model as the tool result.
    async fn execute(
        &self,
        params: HashMap<String, Value>,
        state: &mut RunState,
    ) -> anyhow::Result<String>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name().as_str(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required `String` param, returning a user-friendly error.
pub fn require_string(params: &HashMap<String, Value>, key: &str) -> anyhow::Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))
}

/// Parse a tool-call argument string into a parameter map.
///
/// Empty arguments are accepted as `{}`; anything that isn't a JSON object is
/// rejected.
pub fn parse_arguments(tool: &str, raw: &str) -> Result<HashMap<String, Value>, AgentError> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str::<HashMap<String, Value>>(raw).map_err(|e| {
        AgentError::InvalidArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        }
    })
}
