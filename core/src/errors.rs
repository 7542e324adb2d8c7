//! Error types for chronofact core operations

use thiserror::Error;

/// Main error type for chronofact core operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Graph storage error: {0}")]
    Storage(#[from] GraphError),

    #[error("LLM gateway error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors related to graph storage operations
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Errors related to LLM/embedder gateway operations
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error from provider: {0}")]
    ApiError(String),

    #[error("Upstream timeout")]
    Timeout,

    #[error("Failed to parse provider response: {0}")]
    ResponseParseError(String),

    #[error("Response failed schema validation: {0}")]
    SchemaValidationError(String),

    #[error("Embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    #[error("Internal gateway error: {0}")]
    InternalError(String),
}

/// Errors surfaced at the presentation boundary (REST/MCP), mapped 1:1 onto
/// the domain error kinds named in the spec's error table.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Server startup failed: {0}")]
    StartupFailed(String),

    #[error("Server shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error("Request handling error: {0}")]
    RequestHandling(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for LLM/embedder operations
pub type LlmResult<T> = Result<T, LlmError>;
