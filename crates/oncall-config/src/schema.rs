//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Simulation service connection
    #[serde(default)]
    pub api: RawApiConfig,

    /// Credentials for the simulation service
    #[serde(default)]
    pub auth: RawAuthConfig,

    /// Workday scheduling
    #[serde(default)]
    pub workday: RawWorkdayConfig,
}

/// Simulation service connection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawApiConfig {
    /// Base URL (default: http://127.0.0.1:8000)
    pub base_url: Option<String>,

    /// Per-request timeout (default: 30)
    pub request_timeout_seconds: Option<u64>,
}

/// Credentials. Login happens at startup when both email and password are set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAuthConfig {
    pub email: Option<String>,
    pub password: Option<String>,

    /// Pre-issued access token, used as-is
    pub access_token: Option<String>,
}

/// Workday scheduling settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWorkdayConfig {
    /// Company persona to start with when the host doesn't pick one
    pub company_id: Option<i64>,

    /// Delay before the first incident (default: 5)
    pub initial_delay_seconds: Option<u64>,

    /// Incident target when the service omits one (default: 8)
    pub default_incidents_scheduled: Option<u32>,

    /// Fixed RNG seed for reproducible schedules
    pub seed: Option<u64>,

    /// Replacement for the built-in wait-time distribution
    pub intervals: Option<Vec<RawIntervalBucket>>,
}

/// One bucket of the wait-time distribution: uniform over [min, max)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawIntervalBucket {
    pub weight: f64,
    pub min_seconds: u64,
    pub max_seconds: u64,
    pub label: Option<String>,
}
