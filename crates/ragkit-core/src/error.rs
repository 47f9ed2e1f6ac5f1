//! Error types for ragkit.

use thiserror::Error;

/// Main error type for ragkit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source parsing failed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Text generation (summary/keywords/metadata) failed
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Gateway or client configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Search could not be executed
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Document-level invariant violation
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Document parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("empty source: {0}")]
    EmptySource(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Embedding generation errors.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("embeddings not supported by provider: {0}")]
    NotSupported(String),

    #[error("dimension mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },
}

/// Chat/summarization/keyword generation errors.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("generation not supported by provider: {0}")]
    NotSupported(String),
}

/// Storage layer errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors raised at gateway or client initialization.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("missing required option: {0}")]
    MissingOption(String),

    #[error("invalid value for {option}: {message}")]
    InvalidValue { option: String, message: String },
}

/// Search errors.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("query could not be embedded and no vector was supplied")]
    QueryNotEmbeddable,

    #[error("invalid search option: {0}")]
    InvalidOption(String),
}

/// Document-level invariant violations.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("document has no extractable content: {0}")]
    NoContent(uuid::Uuid),

    #[error("metadata does not conform to schema: {0}")]
    SchemaViolation(String),
}

/// Result type alias for ragkit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::Malformed("truncated xref table".to_string());
        assert_eq!(err.to_string(), "malformed document: truncated xref table");
    }

    #[test]
    fn test_parse_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ParseError = io_err.into();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_embedding_error_display() {
        let err = EmbeddingError::UnrecognizedShape("missing data array".to_string());
        assert_eq!(
            err.to_string(),
            "unrecognized response shape: missing data array"
        );

        let err = EmbeddingError::DimensionMismatch {
            got: 768,
            expected: 1536,
        };
        assert_eq!(err.to_string(), "dimension mismatch: got 768, expected 1536");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Constraint("duplicate chunk_index".to_string());
        assert_eq!(
            err.to_string(),
            "constraint violation: duplicate chunk_index"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingCredential("OPENAI_API_KEY".to_string());
        assert_eq!(err.to_string(), "missing credential: OPENAI_API_KEY");

        let err = ConfigError::UnsupportedProvider("acme".to_string());
        assert_eq!(err.to_string(), "unsupported provider: acme");
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::QueryNotEmbeddable;
        assert!(err.to_string().contains("no vector was supplied"));
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::InvalidTransition {
            from: "processed".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid status transition: processed -> pending"
        );
    }

    #[test]
    fn test_error_from_parse_error() {
        let parse_err = ParseError::UnsupportedFormat("video/mp4".to_string());
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("video/mp4"));
    }

    #[test]
    fn test_error_from_storage_error() {
        let store_err = StorageError::Unavailable("connection refused".to_string());
        let err: Error = store_err.into();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_chain_io_to_parse_to_main() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let parse_err: ParseError = io_err.into();
        let main_err: Error = parse_err.into();

        assert!(matches!(main_err, Error::Parse(ParseError::Io(_))));
        assert!(main_err.to_string().contains("parse error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok_fn() -> Result<u32> {
            Ok(7)
        }

        fn err_fn() -> Result<u32> {
            Err(Error::Search(SearchError::QueryNotEmbeddable))
        }

        assert!(ok_fn().is_ok());
        assert!(err_fn().is_err());
    }
}
