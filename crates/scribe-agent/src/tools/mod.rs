//! Agent tools: the closed action set and its handlers.

pub mod base;
pub mod project;
pub mod registry;

pub use base::{parse_arguments, Tool, ToolName};
pub use project::{CreateProjectTool, WriteFileTool, WriteMode};
pub use registry::ToolRegistry;
