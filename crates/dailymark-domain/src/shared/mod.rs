use serde::{Deserialize, Serialize};

pub mod clock;
pub mod transaction;

pub use clock::{Clock, FixedClock};
pub use transaction::{CheckinTransaction, CheckinUnitOfWork, UnitOfWorkError};

/// Identifier of a user owned by the identity subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Resource Not Found (2xxx)
    UserNotFound = 2001,

    // Check-in (3xxx)
    DuplicateCheckin = 3001,

    // Data & Persistence (4xxx)
    RepositoryError = 4001,
    StoreUnavailable = 4002,
    DataIntegrityError = 4003,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    CacheUnavailable = 5002,

    // Validation (6xxx)
    InvalidInput = 6002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::UserNotFound | ErrorCode::InvalidInput => ErrorSeverity::Info,

            ErrorCode::DuplicateCheckin | ErrorCode::CacheUnavailable => ErrorSeverity::Warning,

            ErrorCode::StoreUnavailable => ErrorSeverity::Critical,

            ErrorCode::RepositoryError
            | ErrorCode::DataIntegrityError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::StoreUnavailable | ErrorCode::CacheUnavailable | ErrorCode::DuplicateCheckin
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// A concurrent writer already inserted the (user, date) key. Resolved
    /// inside the log by reading the winner back.
    #[error("Duplicate check-in for user {user_id} on {date}")]
    DuplicateCheckin {
        user_id: UserId,
        date: chrono::NaiveDate,
    },

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::UserNotFound(_) => ErrorCode::UserNotFound,
            DomainError::DuplicateCheckin { .. } => ErrorCode::DuplicateCheckin,
            DomainError::CacheUnavailable(_) => ErrorCode::CacheUnavailable,
            DomainError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::DataIntegrity(_) => ErrorCode::DataIntegrityError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    pub fn is_cache_unavailable(&self) -> bool {
        matches!(self, DomainError::CacheUnavailable(_))
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
