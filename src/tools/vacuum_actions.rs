use super::{ToolError, ToolResult};
use crate::vacuum::{DeviceSessionManager, RoomMap, SessionError};
use serde_json::{json, Value};

/// Session errors go back to the LLM as data, not as tool failures.
fn error_result(error: SessionError) -> ToolResult {
    ToolResult::Escalation(json!({ "error": error.to_string() }))
}

/// Report the vacuum status for the LLM to summarize
pub async fn get_status(manager: &DeviceSessionManager) -> Result<ToolResult, ToolError> {
    match manager.get_status().await {
        Ok(report) => {
            let data = serde_json::to_value(&report)
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            Ok(ToolResult::Escalation(data))
        }
        Err(e) => Ok(error_result(e)),
    }
}

/// Send a parameterless command named in `{"command": "..."}`
pub async fn send_basic_command(
    manager: &DeviceSessionManager,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let command = arguments
        .get("command")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters("'command' is required".to_string()))?;

    match manager.send_basic_command(command).await {
        Ok(message) => Ok(ToolResult::Success(Some(message))),
        Err(e) => Ok(error_result(e)),
    }
}

/// Clean rooms given as `{"segments": [..]}` and/or `{"rooms": [..]}`
pub async fn app_segment_clean(
    manager: &DeviceSessionManager,
    rooms: &RoomMap,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let segments = segments_from_arguments(rooms, arguments)?;

    match manager.send_segment_clean(&segments).await {
        Ok(ack) => Ok(ToolResult::Escalation(ack)),
        Err(e) => Ok(error_result(e)),
    }
}

fn segments_from_arguments(rooms: &RoomMap, arguments: &Value) -> Result<Vec<u32>, ToolError> {
    let mut segments: Vec<u32> = Vec::new();

    if let Some(values) = arguments.get("segments") {
        let values = values.as_array().ok_or_else(|| {
            ToolError::InvalidParameters("'segments' must be a list of integers".to_string())
        })?;
        for value in values {
            let segment = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ToolError::InvalidParameters(format!("invalid segment number: {}", value))
                })?;
            if !segments.contains(&segment) {
                segments.push(segment);
            }
        }
    }

    if let Some(values) = arguments.get("rooms") {
        let names = values
            .as_array()
            .and_then(|names| names.iter().map(|n| n.as_str()).collect::<Option<Vec<_>>>())
            .ok_or_else(|| {
                ToolError::InvalidParameters("'rooms' must be a list of room names".to_string())
            })?;
        let resolved = rooms
            .resolve(&names)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;
        for segment in resolved {
            if !segments.contains(&segment) {
                segments.push(segment);
            }
        }
    }

    if segments.is_empty() {
        return Err(ToolError::InvalidParameters(
            "pass at least one segment or room".to_string(),
        ));
    }
    Ok(segments)
}
