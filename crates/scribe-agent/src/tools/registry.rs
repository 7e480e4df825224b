//! Tool Registry: maps each `ToolName` to its handler.
//!
//! `compress_context` is part of the declared schema but never registered:
//! the agent loop intercepts it before dispatch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use scribe_core::types::ToolDefinition;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::base::{Tool, ToolName};
use super::project::{CreateProjectTool, WriteFileTool};
use crate::error::AgentError;
use crate::state::RunState;

const COMPRESS_CONTEXT_DESCRIPTION: &str = "INTERNAL TOOL - This is automatically called by the system when \
     token limit is approached. You should not call this manually. It compresses the conversation history \
     to save tokens.";

/// Stores handlers keyed by tool name and dispatches calls.
pub struct ToolRegistry {
    tools: HashMap<ToolName, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// The writing agent's handlers, with projects created under `output_root`.
    pub fn with_defaults(output_root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CreateProjectTool::new(output_root)));
        registry.register(Arc::new(WriteFileTool::new()));
        registry
    }

    /// Register a handler, replacing any previous one for the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!(tool = %tool.name(), "registered tool");
        self.tools.insert(tool.name(), tool);
    }

    /// Look up a handler. `None` for names with no handler.
    pub fn get(&self, name: ToolName) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&name)
    }

    pub fn has(&self, name: ToolName) -> bool {
        self.tools.contains_key(&name)
    }

    /// Registered handler names, sorted for determinism.
    pub fn tool_names(&self) -> Vec<ToolName> {
        let mut names: Vec<ToolName> = self.tools.keys().copied().collect();
        names.sort_by_key(|n| n.as_str());
        names
    }

    /// The schema sent to the model: every registered handler plus the
    /// loop-handled `compress_context`, sorted by name.
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        if !self.has(ToolName::CompressContext) {
            defs.push(compress_context_definition());
        }
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Execute a handler by name.
    pub async fn execute(
        &self,
        name: ToolName,
        params: HashMap<String, Value>,
        state: &mut RunState,
    ) -> Result<String, AgentError> {
        let Some(tool) = self.tools.get(&name) else {
            warn!(tool = %name, "no handler registered");
            return Err(AgentError::UnknownTool(name.to_string()));
        };

        tool.execute(params, state).await.map_err(|e| {
            warn!(tool = %name, error = %e, "tool execution failed");
            AgentError::ToolExecution {
                tool: name.to_string(),
                reason: format!("{e:#}"),
            }
        })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn compress_context_definition() -> ToolDefinition {
    ToolDefinition::new(
        ToolName::CompressContext.as_str(),
        COMPRESS_CONTEXT_DESCRIPTION,
        json!({"type": "object", "properties": {}, "required": []}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Tool that always fails.
    struct FailTool;

    #[async_trait]
    impl Tool for FailTool {
        fn name(&self) -> ToolName {
            ToolName::WriteFile
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }
        async fn execute(
            &self,
            _params: HashMap<String, Value>,
            _state: &mut RunState,
        ) -> anyhow::Result<String> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_defaults_register_two_handlers() {
        let reg = ToolRegistry::with_defaults("output");
        assert_eq!(reg.len(), 2);
        assert_eq!(
            reg.tool_names(),
            vec![ToolName::CreateProject, ToolName::WriteFile]
        );
        assert!(!reg.has(ToolName::CompressContext));
        assert!(reg.get(ToolName::CompressContext).is_none());
    }

    #[test]
    fn test_definitions_declare_all_three() {
        let reg = ToolRegistry::with_defaults("output");
        let names: Vec<String> = reg
            .get_definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["compress_context", "create_project", "write_file"]);
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let tmp = TempDir::new().unwrap();
        let reg = ToolRegistry::with_defaults(tmp.path());
        let mut state = RunState::new();
        let mut params = HashMap::new();
        params.insert("project_name".to_string(), json!("Saga"));

        let result = reg
            .execute(ToolName::CreateProject, params, &mut state)
            .await
            .unwrap();
        assert!(result.contains("Saga"));
        assert_eq!(state.project_dir, Some(tmp.path().join("Saga")));
    }

    #[tokio::test]
    async fn test_execute_unregistered_is_unknown() {
        let reg = ToolRegistry::with_defaults("output");
        let err = reg
            .execute(ToolName::CompressContext, HashMap::new(), &mut RunState::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_execute_error_becomes_tool_execution() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FailTool));
        let err = reg
            .execute(ToolName::WriteFile, HashMap::new(), &mut RunState::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_tool_result(), "Error: write_file failed: disk full");
    }

    #[test]
    fn test_default() {
        assert!(ToolRegistry::default().is_empty());
    }
}
