//! Error handling for the Gold Bar Inventory Engine
//!
//! Provides consistent error messages in English and Spanish

use rust_decimal::Decimal;
use thiserror::Error;

use shared::TransitionError;

/// Engine error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors: raised before any mutation, safe to retry after
    // correcting the input
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Insufficient stock: {requested} x {weight_grams}g requested, {available} available")]
    InsufficientStock {
        weight_grams: Decimal,
        requested: u32,
        available: i64,
    },

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_es: String,
    },

    // Persistence errors: a multi-step operation may have been left
    // partially applied; callers must re-read state before retrying
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the reporting/UI layer
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Wrap a failed pure validation check on a named field
    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidStateTransition(err.to_string())
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;
