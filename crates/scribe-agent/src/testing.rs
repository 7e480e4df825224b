//! Scripted provider shared by the compressor and loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use scribe_core::types::{LlmResponse, Message, ToolCall, ToolDefinition};
use scribe_providers::{LlmError, LlmProvider, LlmRequestConfig};

/// One request the provider received.
#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub messages: Vec<Message>,
    pub with_tools: bool,
}

/// Returns queued results in order and records every request.
pub(crate) struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<LlmResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(responses: Vec<LlmResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _model: &str,
        _config: &LlmRequestConfig,
    ) -> Result<LlmResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            with_tools: tools.is_some(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(LlmResponse::text("(no more responses)")))
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn display_name(&self) -> &str {
        "ScriptedProvider"
    }
}

/// A response carrying the given `(id, name, arguments)` tool calls.
pub(crate) fn tool_calls(calls: &[(&str, &str, &str)]) -> LlmResponse {
    LlmResponse {
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
            .collect(),
        ..Default::default()
    }
}

pub(crate) fn api_error(status: u16) -> LlmError {
    LlmError::Api {
        status,
        body: "upstream unavailable".into(),
    }
}
