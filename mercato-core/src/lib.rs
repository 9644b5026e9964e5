pub mod actor;
pub mod clock;
pub mod directory;
pub mod notify;

pub use actor::{Actor, Role};
pub use clock::{Clock, SystemClock};
pub use directory::{UserDirectory, UserRecord};
pub use notify::{Notification, NotificationSink};

/// Failure taxonomy shared by every core operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: cannot {action} an order in status {from}")]
    InvalidState { action: String, from: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        CoreError::NotFound(what.to_string())
    }

    pub fn invalid_state(action: &str, from: &str) -> Self {
        CoreError::InvalidState {
            action: action.to_string(),
            from: from.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
