//! Configuration validation

use crate::schema::{RawConfig, RawIntervalBucket};
use crate::settings::{MAX_INTERVAL_SECONDS, MIN_INTERVAL_SECONDS};
use thiserror::Error;

/// Allowed slack when checking that bucket weights sum to 1
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),

    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("auth: email and password must be set together")]
    IncompleteCredentials,

    #[error("workday.intervals: at least one bucket is required")]
    NoIntervals,

    #[error("workday.intervals: weights sum to {sum}, expected 1")]
    IntervalWeights { sum: f64 },

    #[error("workday.intervals[{index}]: weight {weight} must be positive")]
    NonPositiveWeight { index: usize, weight: f64 },

    #[error("workday.intervals[{index}]: empty range [{min}, {max})")]
    EmptyIntervalRange { index: usize, min: u64, max: u64 },

    #[error(
        "workday.intervals[{index}]: range [{min}, {max}) outside [{lo}, {hi}]",
        lo = MIN_INTERVAL_SECONDS,
        hi = MAX_INTERVAL_SECONDS
    )]
    IntervalOutOfBounds { index: usize, min: u64, max: u64 },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(url) = &config.api.base_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ValidationError::InvalidBaseUrl(url.clone()));
    }

    if config.api.request_timeout_seconds == Some(0) {
        errors.push(invalid("api.request_timeout_seconds", "must be positive"));
    }

    if config.auth.email.is_some() != config.auth.password.is_some() {
        errors.push(ValidationError::IncompleteCredentials);
    }

    let workday = &config.workday;
    if let Some(id) = workday.company_id
        && id <= 0
    {
        errors.push(invalid("workday.company_id", "must be positive"));
    }
    if workday.default_incidents_scheduled == Some(0) {
        errors.push(invalid("workday.default_incidents_scheduled", "must be positive"));
    }

    if let Some(buckets) = &workday.intervals {
        errors.extend(validate_intervals(buckets));
    }

    errors
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a wait-time bucket table
pub fn validate_intervals(buckets: &[RawIntervalBucket]) -> Vec<ValidationError> {
    if buckets.is_empty() {
        return vec![ValidationError::NoIntervals];
    }

    let mut errors = Vec::new();

    for (index, bucket) in buckets.iter().enumerate() {
        if bucket.weight <= 0.0 || !bucket.weight.is_finite() {
            errors.push(ValidationError::NonPositiveWeight {
                index,
                weight: bucket.weight,
            });
        }

        if bucket.min_seconds >= bucket.max_seconds {
            errors.push(ValidationError::EmptyIntervalRange {
                index,
                min: bucket.min_seconds,
                max: bucket.max_seconds,
            });
        } else if bucket.min_seconds < MIN_INTERVAL_SECONDS
            || bucket.max_seconds > MAX_INTERVAL_SECONDS
        {
            errors.push(ValidationError::IntervalOutOfBounds {
                index,
                min: bucket.min_seconds,
                max: bucket.max_seconds,
            });
        }
    }

    let sum: f64 = buckets.iter().map(|b| b.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        errors.push(ValidationError::IntervalWeights { sum });
    }

    errors
}
