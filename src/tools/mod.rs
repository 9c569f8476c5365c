use crate::vacuum::{BasicCommand, DeviceSessionManager, RoomMap};
use serde_json::Value;
use std::sync::Arc;
use strum::IntoEnumIterator;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod vacuum_actions;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid tool parameters: {0}")]
    InvalidParameters(String),
    #[error("Tool execution was cancelled")]
    Cancelled,
}

#[derive(Debug, PartialEq)]
pub enum ToolResult {
    Success(Option<String>), // Happy path: Some(msg) = say it, None = silent
    Escalation(Value),       // Data the LLM should summarize (including error results)
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub struct ToolRegistry {
    tools: Vec<Tool>,
    manager: Arc<DeviceSessionManager>,
    rooms: RoomMap,
}

impl ToolRegistry {
    pub fn new(manager: Arc<DeviceSessionManager>, rooms: RoomMap) -> Self {
        Self {
            tools: Vec::new(),
            manager,
            rooms,
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Get available tools
    pub fn get_tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Find a tool by name
    pub fn find_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn rooms(&self) -> &RoomMap {
        &self.rooms
    }

    /// Execute a tool by name with cancellation support
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Value,
        cancel_token: CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        // Check if already cancelled before starting
        if cancel_token.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let call = async {
            match name {
                "get_status" => vacuum_actions::get_status(&self.manager).await,
                "send_basic_command" => {
                    vacuum_actions::send_basic_command(&self.manager, &arguments).await
                }
                "app_segment_clean" => {
                    vacuum_actions::app_segment_clean(&self.manager, &self.rooms, &arguments)
                        .await
                }
                _ => Err(ToolError::NotFound(format!("Tool '{}' not found", name))),
            }
        };

        tokio::select! {
            result = call => result,
            _ = cancel_token.cancelled() => Err(ToolError::Cancelled),
        }
    }

    /// Execute a tool, then drop the vacuum session whatever the outcome.
    /// For one-shot callers that exit right after the call.
    pub async fn execute_tool_and_reset(
        &self,
        name: &str,
        arguments: Value,
        cancel_token: CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let result = self.execute_tool(name, arguments, cancel_token).await;
        self.manager.reset().await;
        result
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters
                    }
                })
            })
            .collect()
    }
}

/// Registry with the vacuum tools registered
pub fn create_vacuum_registry(
    manager: Arc<DeviceSessionManager>,
    rooms: RoomMap,
) -> ToolRegistry {
    let command_help = BasicCommand::iter()
        .map(|command| format!("{} ({})", command, command.description()))
        .collect::<Vec<_>>()
        .join(", ");
    let room_help = rooms
        .rooms()
        .iter()
        .map(|room| format!("{} = {}", room.segment, room.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut registry = ToolRegistry::new(manager, rooms);

    registry.register_tool(Tool {
        name: "get_status".to_string(),
        description: "Get the vacuum's state, battery level, cleaning progress, error, fan speed, mop mode and whether it is docked".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    });

    registry.register_tool(Tool {
        name: "send_basic_command".to_string(),
        description: format!("Send a command without parameters to the vacuum: {}", command_help),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": BasicCommand::names(),
                    "description": "Command name"
                }
            },
            "required": ["command"]
        }),
    });

    registry.register_tool(Tool {
        name: "app_segment_clean".to_string(),
        description: format!(
            "Clean one or more rooms. Pass segment numbers or room names. Segment mapping: {}",
            room_help
        ),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "segments": {
                    "type": "array",
                    "items": { "type": "integer", "minimum": 1 },
                    "description": "Segment numbers to clean, e.g. [21, 22]"
                },
                "rooms": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Room names to clean, e.g. [\"Hallway\"]"
                }
            },
            "required": []
        }),
    });

    registry
}
