//! Configuration for the engine and for the service binary.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::MsaeError;

/// Default radius inside which a hazard puts a vessel at risk.
pub const DEFAULT_RISK_RADIUS_KM: f64 = 200.0;

/// Default radius inside which a vessel is reported near a port.
pub const DEFAULT_ALERT_RADIUS_KM: f64 = 50.0;

/// Default cap on the number of proximity alerts in one report.
pub const DEFAULT_MAX_ALERTS: usize = 5;

/// Default port for the HTTP service.
pub const DEFAULT_PORT: u16 = 3000;

/// Default tracking backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

/// Default snapshot polling interval in seconds.
pub const DEFAULT_POLL_SECS: u64 = 15;

/// Source of the report timestamp.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Per-run engine options.
#[derive(Clone)]
pub struct EngineConfig {
    /// Risk radius for hazards that do not carry their own.
    pub risk_radius_km: f64,

    /// Port proximity radius.
    pub alert_radius_km: f64,

    /// Maximum number of alerts; 0 suppresses alerts.
    pub max_alerts: usize,

    /// Stamps `generated_at`. Never used to filter data.
    pub clock: Clock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_radius_km: DEFAULT_RISK_RADIUS_KM,
            alert_radius_km: DEFAULT_ALERT_RADIUS_KM,
            max_alerts: DEFAULT_MAX_ALERTS,
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("risk_radius_km", &self.risk_radius_km)
            .field("alert_radius_km", &self.alert_radius_km)
            .field("max_alerts", &self.max_alerts)
            .finish_non_exhaustive()
    }
}

impl EngineConfig {
    pub fn with_risk_radius_km(mut self, km: f64) -> Self {
        self.risk_radius_km = km;
        self
    }

    pub fn with_alert_radius_km(mut self, km: f64) -> Self {
        self.alert_radius_km = km;
        self
    }

    pub fn with_max_alerts(mut self, max_alerts: usize) -> Self {
        self.max_alerts = max_alerts;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Pin the report timestamp, for reproducible output.
    pub fn fixed_clock(self, at: DateTime<Utc>) -> Self {
        self.with_clock(move || at)
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Both radii must be positive and finite.
    pub fn validate(&self) -> Result<(), MsaeError> {
        for (name, value) in [
            ("risk_radius_km", self.risk_radius_km),
            ("alert_radius_km", self.alert_radius_km),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MsaeError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Service settings, read from `SEAWATCH_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub backend_url: String,

    /// Bearer token forwarded to the backend.
    pub api_token: Option<String>,

    pub poll_interval: Duration,
    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            api_token: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or unparseable values fall
    /// back to defaults, as do out-of-range radii.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        let positive = |key: &str, default: f64| {
            parsed(key)
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(default)
        };

        let engine = EngineConfig::default()
            .with_risk_radius_km(positive("SEAWATCH_RISK_RADIUS_KM", DEFAULT_RISK_RADIUS_KM))
            .with_alert_radius_km(positive("SEAWATCH_ALERT_RADIUS_KM", DEFAULT_ALERT_RADIUS_KM))
            .with_max_alerts(
                lookup("SEAWATCH_MAX_ALERTS")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_MAX_ALERTS),
            );

        Self {
            port: lookup("SEAWATCH_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            backend_url: lookup("SEAWATCH_BACKEND_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.backend_url),
            api_token: lookup("SEAWATCH_API_TOKEN").filter(|t| !t.trim().is_empty()),
            poll_interval: lookup("SEAWATCH_POLL_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            engine,
        }
    }
}
