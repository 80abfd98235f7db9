use std::{env, path::PathBuf, time::Duration};

use log::warn;

pub const DEFAULT_COUNTS_URL: &str = "https://straysafe.me/api2/counters";
pub const DEFAULT_DETECTIONS_URL: &str = "https://straysafe.me/api2/detected_animals";
pub const BACKGROUND_TASK_ID: &str = "background-notification-fetch";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_BACKGROUND_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 25;
const DEFAULT_DATA_DIR: &str = "straysafe-data";

/// Runtime configuration for the detection engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub counts_url: String,
    pub detections_url: String,
    /// Foreground timer period.
    pub poll_interval: Duration,
    /// Minimum-interval hint handed to the background runtime.
    pub background_interval: Duration,
    pub request_timeout: Duration,
    /// Upper bound on a single check before it is treated as failed.
    pub check_timeout: Duration,
    pub counter_tracking: bool,
    pub data_dir: PathBuf,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            counts_url: DEFAULT_COUNTS_URL.into(),
            detections_url: DEFAULT_DETECTIONS_URL.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            background_interval: Duration::from_secs(DEFAULT_BACKGROUND_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
            counter_tracking: true,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from `STRAYSAFE_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let string_or = |key: &str, fallback: String| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(fallback)
        };

        let secs_or = |key: &str, fallback: Duration| match lookup(key) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!("Ignoring invalid {key}={raw:?}; using {}s", fallback.as_secs());
                    fallback
                }
            },
            None => fallback,
        };

        let flag_or = |key: &str, fallback: bool| {
            lookup(key)
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(fallback)
        };

        Self {
            counts_url: string_or("STRAYSAFE_COUNTS_URL", defaults.counts_url),
            detections_url: string_or("STRAYSAFE_DETECTIONS_URL", defaults.detections_url),
            poll_interval: secs_or("STRAYSAFE_POLL_INTERVAL_SECS", defaults.poll_interval),
            background_interval: secs_or(
                "STRAYSAFE_BACKGROUND_INTERVAL_SECS",
                defaults.background_interval,
            ),
            request_timeout: secs_or("STRAYSAFE_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            check_timeout: secs_or("STRAYSAFE_CHECK_TIMEOUT_SECS", defaults.check_timeout),
            counter_tracking: flag_or("STRAYSAFE_COUNTER_TRACKING", defaults.counter_tracking),
            data_dir: lookup("STRAYSAFE_DATA_DIR")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            debug: flag_or("STRAYSAFE_DEBUG", defaults.debug),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("straysafe.sqlite3")
    }
}
