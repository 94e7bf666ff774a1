//! Shared error type and result alias.

// ============= Error Types =============

/// Errors surfaced by the library.
///
/// Most failures inside a research session are recovered locally (a skipped
/// query, a fallback decision). `AppError` is what the collaborators return to
/// the orchestrator; only planning-transport failures escape as a
/// `success: false` result.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
