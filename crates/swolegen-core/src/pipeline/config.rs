//! Tunables consumed by the pipeline.

use super::error::ConfigError;

/// Default number of repair/retry attempts after the first try.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default byte cap for fetched documents.
pub const DEFAULT_MAX_FETCH_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Attempts after the first; a phase makes at most `retries + 1` calls.
    pub retries: u32,
    /// Longest instructions/history document read, in bytes.
    pub max_fetch_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
        }
    }
}

impl PipelineConfig {
    /// Build from untrusted signed values (env vars, config files).
    pub fn from_raw(retries: i64, max_fetch_bytes: i64) -> Result<Self, ConfigError> {
        let retries = u32::try_from(retries).map_err(|_| ConfigError::InvalidRetries(retries))?;
        let max_fetch_bytes = match usize::try_from(max_fetch_bytes) {
            Ok(n) if n > 0 => n,
            _ => return Err(ConfigError::InvalidFetchCap(max_fetch_bytes)),
        };
        Ok(Self {
            retries,
            max_fetch_bytes,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_fetch_bytes == 0 {
            return Err(ConfigError::InvalidFetchCap(0));
        }
        Ok(())
    }
}
