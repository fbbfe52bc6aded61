//! Job configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

const DEFAULT_NAME: &str = "job";
const DEFAULT_BATCH_SIZE: usize = 100;

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_error_threshold() -> u64 {
    u64::MAX
}

/// Parses a human-readable duration string (`"30s"`, `"5m"`, ...) the same
/// way the engine's builder does, so `JobParameters` round-trips through
/// config files using the same syntax as `JobBuilder::timeout`.
fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) => parse_duration::parse(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Tunables for a single job run, set either through [`crate::builder::JobBuilder`]
/// or deserialized from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParameters {
    /// Identifies the job in logs, reports, and management names.
    #[serde(default = "default_name")]
    pub name: String,
    /// How many survivors to accumulate before handing a batch to the writer.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum `errorCount` tolerated before the run is aborted as FAILED.
    /// `u64::MAX` (the default) means "no threshold".
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u64,
    /// Wall-clock budget for the whole run. `None` means unbounded.
    #[serde(default, deserialize_with = "deserialize_optional_duration")]
    pub timeout: Option<Duration>,
    /// Whether to register a [`crate::monitor::Monitor`] for this run.
    #[serde(default)]
    pub jmx_enabled: bool,
}

impl Default for JobParameters {
    fn default() -> Self {
        Self {
            name: default_name(),
            batch_size: default_batch_size(),
            error_threshold: default_error_threshold(),
            timeout: None,
            jmx_enabled: false,
        }
    }
}

impl JobParameters {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.batch_size == 0 {
            return Err(Error::InvalidParameters("batch_size must be at least 1".into()));
        }
        if self.error_threshold == 0 {
            return Err(Error::InvalidParameters(
                "error_threshold of 0 would abort on the very first error; use 1 or omit it".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let p = JobParameters::default();
        assert_eq!(p.name, "job");
        assert_eq!(p.batch_size, 100);
        assert_eq!(p.error_threshold, u64::MAX);
        assert!(p.timeout.is_none());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut p = JobParameters::default();
        p.batch_size = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_error_threshold_is_rejected() {
        let mut p = JobParameters::default();
        p.error_threshold = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn timeout_deserializes_from_human_readable_string() {
        let json = r#"{"name":"nightly","batch_size":50,"timeout":"30s"}"#;
        let p: JobParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.timeout, Some(Duration::from_secs(30)));
        assert_eq!(p.error_threshold, u64::MAX);
    }
}
