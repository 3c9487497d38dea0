use thiserror::Error;

/// Errors that can occur in the Wayfarer application
#[derive(Error, Debug, Clone)]
pub enum WayfarerError {
    /// Error when a required credential or config value is missing/invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network error for HTTP requests
    #[error("Network error: {0}")]
    Network(String),

    /// Error returned by an LLM provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Error when filling a prompt template
    #[error("Template error: missing placeholder value for '{0}'")]
    Template(String),

    /// Error when parsing a response or a document
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error when serializing data
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error produced while running an agent task
    #[error("Agent '{agent}' failed: {message}")]
    Agent { agent: String, message: String },

    /// Error when an unknown tool is requested
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Type alias for Result with WayfarerError
pub type Result<T> = std::result::Result<T, WayfarerError>;

impl From<std::io::Error> for WayfarerError {
    fn from(error: std::io::Error) -> Self {
        WayfarerError::Io(error.to_string())
    }
}

impl From<anyhow::Error> for WayfarerError {
    fn from(error: anyhow::Error) -> Self {
        WayfarerError::Agent {
            agent: "unknown".to_string(),
            message: format!("{error}"),
        }
    }
}

impl WayfarerError {
    /// Create an agent error with context about which agent failed.
    pub fn agent(agent: &str, message: impl Into<String>) -> Self {
        WayfarerError::Agent {
            agent: agent.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WayfarerError::Template("research".to_string());
        assert!(err.to_string().contains("research"));

        let err = WayfarerError::agent("weather", "timed out");
        assert_eq!(err.to_string(), "Agent 'weather' failed: timed out");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WayfarerError = io.into();
        assert!(matches!(err, WayfarerError::Io(_)));
    }
}
