//! Blocking client for the World Bank v2 indicator API.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use stability_core::settings::{PipelineSettings, DEFAULT_API_BASE_URL, DEFAULT_MAX_RETRIES};
use tracing::{debug, warn};

use crate::error::{FetchError, Result};

/// Delay before the second attempt; doubled for each further attempt.
const BASE_BACKOFF_MS: u64 = 500;

/// Doublings after which the delay stops growing (500 ms << 6 = 32 s).
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

/// Sleep before attempt number `attempt` (0-based).
fn backoff_ms(attempt: u32) -> u64 {
    match attempt {
        0 => 0,
        n => BASE_BACKOFF_MS << (n - 1).min(MAX_BACKOFF_DOUBLINGS),
    }
}

/// Anything that can return the raw JSON series for one country and indicator.
pub trait IndicatorSource {
    fn fetch_indicator(
        &self,
        country: &str,
        indicator: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Value>;
}

pub struct WorldBankClient {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
}

impl Default for WorldBankClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_MAX_RETRIES)
    }
}

impl WorldBankClient {
    /// `max_retries` is the total number of attempts per request; `0` is
    /// treated as `1`.
    pub fn new(base_url: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.api_base_url.clone(), settings.max_retries)
    }

    pub fn indicator_url(
        &self,
        country: &str,
        indicator: &str,
        start_year: i32,
        end_year: i32,
    ) -> String {
        format!(
            "{}/country/{}/indicator/{}?date={}:{}&format=json",
            self.base_url, country, indicator, start_year, end_year
        )
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.client.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl IndicatorSource for WorldBankClient {
    /// GET the series, retrying transient failures with exponential back-off
    /// (0 ms, 500 ms, 1 s, ... capped at 32 s).
    fn fetch_indicator(
        &self,
        country: &str,
        indicator: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Value> {
        let url = self.indicator_url(country, indicator, start_year, end_year);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let sleep_ms = backoff_ms(attempt);
                debug!(attempt, sleep_ms, "retrying indicator request after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }
            attempt += 1;

            match self.get_json(&url) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    warn!(attempt, url = %url, error = %e, "indicator request failed");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
