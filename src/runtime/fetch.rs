//! HTTP download of installer scripts.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::cell::Cell;
use std::time::Duration;

use crate::retry::{retry_fixed, Exhausted, RetryPolicy};
use crate::shell::{CommandOptions, CommandRunner};

/// Downloads installer scripts.
pub trait ScriptFetcher {
    /// Fetch the script at `url` as text.
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches installer scripts over HTTPS.
pub struct HttpFetcher {
    client: Client,
}

/// Per-request timeout for installer downloads.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hostprep/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ScriptFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let body = response.text()?;
        if body.trim().is_empty() {
            bail!("empty response from {}", url);
        }
        Ok(body)
    }
}

/// Download the script at `url` and pipe it into `interpreter`.
///
/// Download and execution are retried together under `policy`, so a
/// truncated download that fails to run is fetched again.
pub fn fetch_and_run(
    fetcher: &dyn ScriptFetcher,
    runner: &dyn CommandRunner,
    url: &str,
    interpreter: &str,
    options: &CommandOptions,
    policy: RetryPolicy,
) -> std::result::Result<(), Exhausted<String>> {
    retry_fixed(policy, url, |_| true, |attempt| {
        tracing::debug!("Fetching {} (attempt {})", url, attempt);
        let script = fetcher.fetch(url).map_err(|e| format!("{:#}", e))?;
        let options = options.clone().with_stdin(script);
        let result = runner
            .run(interpreter, &options)
            .map_err(|e| e.to_string())?;
        if result.success {
            Ok(())
        } else {
            Err(result.failure_summary())
        }
    })
}

/// Fetcher that returns a fixed body, for tests.
///
/// Every call is counted; [`StaticFetcher::failing`] fails every call.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    body: Option<String>,
    calls: Cell<u32>,
    failures_left: Cell<u32>,
}

impl StaticFetcher {
    /// Always return `body`.
    pub fn new(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Fail the first `times` calls, then return `body`.
    pub fn flaky(body: &str, times: u32) -> Self {
        let fetcher = Self::new(body);
        fetcher.failures_left.set(times);
        fetcher
    }

    /// Number of fetches attempted.
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl ScriptFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            bail!("connection reset fetching {}", url);
        }
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => bail!("could not resolve host for {}", url),
        }
    }
}
