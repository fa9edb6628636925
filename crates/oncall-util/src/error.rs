//! Error types for oncall-sim

use thiserror::Error;

use crate::CompanyId;

/// Core error type for oncall-sim operations
#[derive(Debug, Error)]
pub enum OncallError {
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    #[error("No active workday")]
    NoActiveWorkday,

    #[error("Workday already active")]
    WorkdayAlreadyActive,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OncallError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendError(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, OncallError>;
