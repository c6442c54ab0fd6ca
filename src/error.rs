use thiserror::Error;

/// Failure reported by a CRUD collaborator (booking, vehicle or route store).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Errors that abort a planning run outright. Everything discovered mid-plan
/// degrades to warnings in the outcome instead.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to fetch bookings: {0}")]
    FetchFailed(#[from] StoreError),
}

/// Delivery failure reported by a channel sender collaborator.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SendError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutesErrorKind {
    MissingApiKey,
    InvalidWaypoint,
    InvalidRequest,
    MaxWaypointsExceeded,
    ApiError,
    QuotaExceeded,
    RequestDenied,
    ZeroResults,
    Timeout,
    NetworkError,
}

/// Classified error from the routing provider adapter. `retryable` is decided
/// at classification time and drives the retry wrapper.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RoutesError {
    pub kind: RoutesErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl RoutesError {
    pub fn new(kind: RoutesErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(kind: RoutesErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: true,
        }
    }
}

/// Top-level error for the binary: config parsing and wiring.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    Internal(String),
}
