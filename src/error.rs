//! Error types for the knowledge-graph extractor

use thiserror::Error;

use crate::kg::DocKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API key is required for the remote LLM backend (set NVIDIA_API_KEY or use local mode)")]
    MissingApiKey,

    #[error("Document key already present in the knowledge store: {0}")]
    DuplicateKey(DocKey),

    #[error("LLM API error: {0}")]
    LlmError(String),

    #[error("Local model error: {0}")]
    LocalModelError(String),

    #[error("Knowledge store file is locked by another process: {0}")]
    StoreLocked(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Error::LlmError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_api_key() {
        let err = Error::MissingApiKey;
        assert!(err.to_string().contains("API key is required"));
        assert!(err.to_string().contains("NVIDIA_API_KEY"));
    }

    #[test]
    fn test_error_display_duplicate_qa_key() {
        let err = Error::DuplicateKey(DocKey::qa("Who?", "Alice"));
        let msg = err.to_string();
        assert!(msg.contains("already present"));
        assert!(msg.contains("Who?"));
        assert!(msg.contains("Alice"));
    }

    #[test]
    fn test_error_display_duplicate_id_key() {
        let err = Error::DuplicateKey(DocKey::Id(7));
        assert!(err.to_string().contains("#7"));
    }

    #[test]
    fn test_error_display_llm_error() {
        let err = Error::LlmError("rate limit exceeded".to_string());
        assert!(err.to_string().contains("LLM API error"));
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_error_display_local_model_error() {
        let err = Error::LocalModelError("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Local model error"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_error_display_store_locked() {
        let err = Error::StoreLocked("kg.json".to_string());
        assert!(err.to_string().contains("locked"));
        assert!(err.to_string().contains("kg.json"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();

        assert!(matches!(err, Error::SerializationError(_)));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_from_serde_yaml() {
        let yaml_err = serde_yaml::from_str::<Vec<i32>>("{ not: [a list").unwrap_err();
        let err: Error = yaml_err.into();

        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_from_openai_error() {
        let api_err = async_openai::error::OpenAIError::InvalidArgument("bad".to_string());
        let err: Error = api_err.into();

        assert!(matches!(err, Error::LlmError(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_result_unwrap_or_else() {
        let result: Result<i32> = Err(Error::InvalidArgument("error".to_string()));
        let value = result.unwrap_or_else(|_| 42);
        assert_eq!(value, 42);
    }
}
