//! Error types shared by the core services.

use thiserror::Error;
use uuid::Uuid;

/// Input rejected before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("manager is required")]
    ManagerRequired,

    #[error("client name is required")]
    BlankClientName,

    #[error("recurring interval is required when recurring is enabled")]
    IntervalRequired,

    #[error("{field} must not be negative (got {value})")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("invalid month {0:?} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("date {0} cannot be advanced any further")]
    DateOutOfRange(chrono::NaiveDate),

    #[error("user name is required")]
    BlankUserName,

    #[error("invalid email address {0:?}")]
    InvalidEmail(String),
}

/// Errors returned by the core services.
#[derive(Debug, Error)]
pub enum HiveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("client {0} not found")]
    ClientNotFound(Uuid),

    #[error("client {0} is not recurring")]
    NotRecurring(Uuid),

    /// A store call failed. Never retried.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl HiveError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotRecurring(_))
    }
}

pub type HiveResult<T> = Result<T, HiveError>;
