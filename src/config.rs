//! Engine configuration.
//!
//! All values have defaults suited to a single-timezone organization. Use
//! [`LifecycleConfig::from_json`] to load overrides from a document.
//!
//! # Example
//!
//! ```
//! use taskrota::config::LifecycleConfig;
//!
//! let config = LifecycleConfig::from_json(r#"{ "utc_offset_seconds": 3600 }"#)
//!     .expect("valid configuration");
//! assert_eq!(config.utc_offset().local_minus_utc(), 3600);
//! assert_eq!(config.due_soon_window().num_hours(), 24);
//! ```

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_UTC_OFFSET_SECONDS: i32 = 7 * 3600;
const DEFAULT_DUE_SOON_WINDOW_MINUTES: u32 = 24 * 60;
const DEFAULT_SCAN_INTERVAL_MINUTES: u32 = 60;
const DEFAULT_ATTENTION_WINDOW_MINUTES: u32 = 48 * 60;

/// Errors raised while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The UTC offset is outside ±24 hours.
    #[error("invalid UTC offset: {0} seconds")]
    InvalidUtcOffset(i32),

    /// A window or interval is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Stored shape of [`LifecycleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct RawLifecycleConfig {
    utc_offset_seconds: i32,
    due_soon_window_minutes: u32,
    scan_interval_minutes: u32,
    attention_window_minutes: u32,
}

impl Default for RawLifecycleConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: DEFAULT_UTC_OFFSET_SECONDS,
            due_soon_window_minutes: DEFAULT_DUE_SOON_WINDOW_MINUTES,
            scan_interval_minutes: DEFAULT_SCAN_INTERVAL_MINUTES,
            attention_window_minutes: DEFAULT_ATTENTION_WINDOW_MINUTES,
        }
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLifecycleConfig", into = "RawLifecycleConfig")]
pub struct LifecycleConfig {
    utc_offset: FixedOffset,
    due_soon_window_minutes: u32,
    scan_interval_minutes: u32,
    attention_window_minutes: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECONDS)
                .unwrap_or_else(|| Utc.fix()),
            due_soon_window_minutes: DEFAULT_DUE_SOON_WINDOW_MINUTES,
            scan_interval_minutes: DEFAULT_SCAN_INTERVAL_MINUTES,
            attention_window_minutes: DEFAULT_ATTENTION_WINDOW_MINUTES,
        }
    }
}

impl LifecycleConfig {
    /// Parses a JSON document, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or a value is
    /// out of range.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let raw: RawLifecycleConfig = serde_json::from_str(document)?;
        Self::try_from(raw)
    }

    /// Returns a copy evaluating calendars at `seconds` east of UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUtcOffset`] outside ±24 hours.
    pub fn with_utc_offset_seconds(self, seconds: i32) -> Result<Self, ConfigError> {
        let utc_offset =
            FixedOffset::east_opt(seconds).ok_or(ConfigError::InvalidUtcOffset(seconds))?;
        Ok(Self { utc_offset, ..self })
    }

    /// Returns the organization's UTC offset.
    #[must_use]
    pub const fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Returns how far ahead the due-soon scan looks.
    #[must_use]
    pub fn due_soon_window(&self) -> Duration {
        Duration::minutes(i64::from(self.due_soon_window_minutes))
    }

    /// Returns the cadence of the due-soon scan.
    #[must_use]
    pub fn scan_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.scan_interval_minutes) * 60)
    }

    /// Returns how soon a high-priority task must be due to need attention.
    #[must_use]
    pub fn attention_window(&self) -> Duration {
        Duration::minutes(i64::from(self.attention_window_minutes))
    }
}

impl TryFrom<RawLifecycleConfig> for LifecycleConfig {
    type Error = ConfigError;

    fn try_from(raw: RawLifecycleConfig) -> Result<Self, Self::Error> {
        let utc_offset = FixedOffset::east_opt(raw.utc_offset_seconds)
            .ok_or(ConfigError::InvalidUtcOffset(raw.utc_offset_seconds))?;
        for (name, minutes) in [
            ("due_soon_window_minutes", raw.due_soon_window_minutes),
            ("scan_interval_minutes", raw.scan_interval_minutes),
            ("attention_window_minutes", raw.attention_window_minutes),
        ] {
            if minutes == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        Ok(Self {
            utc_offset,
            due_soon_window_minutes: raw.due_soon_window_minutes,
            scan_interval_minutes: raw.scan_interval_minutes,
            attention_window_minutes: raw.attention_window_minutes,
        })
    }
}

impl From<LifecycleConfig> for RawLifecycleConfig {
    fn from(config: LifecycleConfig) -> Self {
        Self {
            utc_offset_seconds: config.utc_offset.local_minus_utc(),
            due_soon_window_minutes: config.due_soon_window_minutes,
            scan_interval_minutes: config.scan_interval_minutes,
            attention_window_minutes: config.attention_window_minutes,
        }
    }
}
