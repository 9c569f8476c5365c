use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Roborock API error: {0}")]
    Api(#[from] crate::vacuum::ApiError),

    #[error("Tool error: {0}")]
    Tool(#[from] crate::tools::ToolError),

    #[error("Vacuum reported an error: {0}")]
    Device(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::tools::ToolError;

    #[test]
    fn test_layer_errors_convert() {
        let err: AgentError = ConfigError::MissingEnvVar("ROBOROCK_USERNAME".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: ROBOROCK_USERNAME"
        );

        let err: AgentError = ToolError::Cancelled.into();
        assert!(matches!(err, AgentError::Tool(ToolError::Cancelled)));
        assert_eq!(err.to_string(), "Tool error: Tool execution was cancelled");
    }

    #[test]
    fn test_device_error_text() {
        let err = AgentError::Device("Error sending app_start: dustbin missing".to_string());
        assert_eq!(
            err.to_string(),
            "Vacuum reported an error: Error sending app_start: dustbin missing"
        );
    }
}
