/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Documents and external ids differ in length: {documents} vs {ids}")]
    ArityMismatch { documents: usize, ids: usize },

    #[error("No player profile is linked to this account")]
    NotBound,

    #[error("User library is empty")]
    EmptyLibrary,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, suitable for API payloads and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::HttpClient(_) | AppError::Upstream(_) => "upstream_unavailable",
            AppError::Io(_) => "io_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::ArityMismatch { .. } => "arity_mismatch",
            AppError::NotBound => "profile_not_bound",
            AppError::EmptyLibrary => "empty_library",
            AppError::NotFound(_) => "not_found",
            AppError::DataIntegrity(_) => "data_integrity",
            AppError::Internal(_) => "internal_error",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
