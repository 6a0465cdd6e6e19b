use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Geocoding error: {0}")]
    Geo(#[from] GeoError),

    #[error("Questionnaire error: {0}")]
    Questionnaire(#[from] QuestionnaireError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Questionnaire contract violations.
///
/// These only occur when a caller offers an answer that the active
/// question set does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionnaireError {
    #[error("Unknown question: {question_id}")]
    UnknownQuestion { question_id: u32 },

    #[error("Invalid weight {weight} for question {question_id}")]
    InvalidWeight { question_id: u32, weight: u8 },

    #[error("Duplicate question id: {question_id}")]
    DuplicateQuestion { question_id: u32 },
}

/// Assessment session state errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Questionnaire incomplete: {answered} of {total} answered")]
    Incomplete { answered: usize, total: usize },

    #[error("Invalid session phase: expected {expected}, found {found}")]
    InvalidPhase { expected: String, found: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Store API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Prediction endpoint errors
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Prediction service unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Geocoding and provider search errors
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Location not found: {query}")]
    NotFound { query: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for prediction calls
pub type PredictionResult<T> = Result<T, PredictionError>;

/// Result type alias for geocoding operations
pub type GeoResult<T> = Result<T, GeoError>;
