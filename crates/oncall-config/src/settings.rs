//! Validated settings structures

use crate::schema::{RawApiConfig, RawAuthConfig, RawConfig, RawIntervalBucket, RawWorkdayConfig};
use oncall_util::CompanyId;
use std::time::Duration;

/// Shortest wait the scheduler may produce
pub const MIN_INTERVAL_SECONDS: u64 = 10;

/// Longest wait the scheduler may produce
pub const MAX_INTERVAL_SECONDS: u64 = 14_400;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_INITIAL_DELAY_SECONDS: u64 = 5;

/// Validated settings ready for use by the driver and controller
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub workday: WorkdaySettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            api: ApiSettings::from_raw(raw.api),
            auth: AuthSettings::from_raw(raw.auth),
            workday: WorkdaySettings::from_raw(raw.workday),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::from_raw(RawApiConfig::default()),
            auth: AuthSettings::default(),
            workday: WorkdaySettings::from_raw(RawWorkdayConfig::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl ApiSettings {
    fn from_raw(raw: RawApiConfig) -> Self {
        Self {
            base_url: raw
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                raw.request_timeout_seconds
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            ),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub credentials: Option<Credentials>,
    pub access_token: Option<String>,
}

impl AuthSettings {
    fn from_raw(raw: RawAuthConfig) -> Self {
        let credentials = match (raw.email, raw.password) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            _ => None,
        };

        Self {
            credentials,
            access_token: raw.access_token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkdaySettings {
    pub company_id: Option<CompanyId>,
    pub initial_delay_seconds: u64,
    pub default_incidents_scheduled: u32,
    pub seed: Option<u64>,
    pub intervals: Vec<IntervalBucket>,
}

impl WorkdaySettings {
    fn from_raw(raw: RawWorkdayConfig) -> Self {
        Self {
            company_id: raw.company_id.map(CompanyId::new),
            initial_delay_seconds: raw
                .initial_delay_seconds
                .unwrap_or(DEFAULT_INITIAL_DELAY_SECONDS),
            default_incidents_scheduled: raw
                .default_incidents_scheduled
                .unwrap_or(oncall_api::DEFAULT_INCIDENTS_SCHEDULED),
            seed: raw.seed,
            intervals: raw
                .intervals
                .map(|buckets| buckets.into_iter().map(convert_bucket).collect())
                .unwrap_or_else(default_interval_buckets),
        }
    }
}

impl Default for WorkdaySettings {
    fn default() -> Self {
        Self::from_raw(RawWorkdayConfig::default())
    }
}

/// One bucket of the wait-time distribution: uniform over `[min_seconds, max_seconds)`
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBucket {
    pub weight: f64,
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub label: String,
}

impl IntervalBucket {
    pub fn new(weight: f64, min_seconds: u64, max_seconds: u64, label: &str) -> Self {
        Self {
            weight,
            min_seconds,
            max_seconds,
            label: label.to_string(),
        }
    }
}

fn convert_bucket(raw: RawIntervalBucket) -> IntervalBucket {
    IntervalBucket {
        label: raw
            .label
            .unwrap_or_else(|| format!("{}-{}s", raw.min_seconds, raw.max_seconds)),
        weight: raw.weight,
        min_seconds: raw.min_seconds,
        max_seconds: raw.max_seconds,
    }
}

/// Built-in wait-time distribution, biased toward short waits
pub fn default_interval_buckets() -> Vec<IntervalBucket> {
    vec![
        IntervalBucket::new(0.30, 10, 300, "quick"),
        IntervalBucket::new(0.40, 300, 3600, "normal"),
        IntervalBucket::new(0.20, 3600, 7200, "longer break"),
        IntervalBucket::new(0.10, 7200, MAX_INTERVAL_SECONDS, "very long break"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.api.request_timeout, Duration::from_secs(30));
        assert!(settings.auth.credentials.is_none());
        assert_eq!(settings.workday.initial_delay_seconds, 5);
        assert_eq!(settings.workday.default_incidents_scheduled, 8);
        assert_eq!(settings.workday.intervals, default_interval_buckets());
    }

    #[test]
    fn test_default_buckets_cover_range() {
        let buckets = default_interval_buckets();
        let total: f64 = buckets.iter().map(|b| b.weight).sum();

        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(buckets.first().unwrap().min_seconds, MIN_INTERVAL_SECONDS);
        assert_eq!(buckets.last().unwrap().max_seconds, MAX_INTERVAL_SECONDS);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].max_seconds, pair[1].min_seconds);
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = ApiSettings::from_raw(RawApiConfig {
            base_url: Some("https://sim.example.com/".into()),
            request_timeout_seconds: Some(5),
        });
        assert_eq!(api.base_url, "https://sim.example.com");
        assert_eq!(api.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bucket_label_fallback() {
        let bucket = convert_bucket(RawIntervalBucket {
            weight: 1.0,
            min_seconds: 10,
            max_seconds: 60,
            label: None,
        });
        assert_eq!(bucket.label, "10-60s");
    }
}
