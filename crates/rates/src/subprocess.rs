use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::fetch::{payload_to_rates, FetchedRates, RateFetchError, RateFetcher, RatePayload};

/// Runs the configured fetch program (no arguments) and parses the single
/// JSON object it prints. The process is awaited to completion; stdout is
/// accumulated, never streamed.
pub struct SubprocessRateFetcher {
    program: PathBuf,
    timeout: Duration,
}

impl SubprocessRateFetcher {
    pub fn new(program: PathBuf, timeout_secs: u64) -> Self {
        Self { program, timeout: Duration::from_secs(timeout_secs.max(1)) }
    }
}

#[async_trait]
impl RateFetcher for SubprocessRateFetcher {
    async fn fetch(&self) -> Result<FetchedRates, RateFetchError> {
        let output = tokio::time::timeout(self.timeout, Command::new(&self.program).output())
            .await
            .map_err(|_| RateFetchError::Timeout(self.timeout.as_secs()))?
            .map_err(|error| RateFetchError::Spawn(error.to_string()))?;

        if !output.status.success() {
            return Err(RateFetchError::NonZeroExit(output.status.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let payload: RatePayload = serde_json::from_str(stdout.trim())
            .map_err(|error| RateFetchError::Parse(error.to_string()))?;
        payload_to_rates(payload)
    }
}
