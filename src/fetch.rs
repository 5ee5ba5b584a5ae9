//! HTTP retrieval with linear backoff retry logic.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the network can be swapped out:
//! - [`Transport`]: Core trait performing a single GET
//! - [`ReqwestTransport`]: Production transport backed by `reqwest`
//! - [`Sleeper`]: Delay between attempts ([`TokioSleeper`] in production)
//! - [`RetryFetch`]: Decorator that adds retry logic to any [`Transport`]
//!
//! # Retry Strategy
//!
//! - 3 attempts in total by default
//! - Network errors, timeouts and non-2xx statuses are all retried
//! - Linear backoff: `backoff_step * attempt` after each failed attempt,
//!   nothing after the last one

use crate::error::{ExtractError, FetchFailure};
use crate::models::FetchResult;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(800);

/// Tunables for the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub user_agent: String,
    pub accept_language: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Total attempts, first one included.
    pub max_attempts: usize,
    /// Delay unit; the wait after attempt `n` is `backoff_step * n`.
    pub backoff_step: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

/// A response as returned by one transport call, before status checking.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Trait for a single HTTP GET.
///
/// Implementors perform exactly one request; retrying is the job of
/// [`RetryFetch`].
pub trait Transport {
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchFailure>;
}

/// Trait for waiting between attempts.
pub trait Sleeper {
    async fn sleep(&self, delay: Duration);
}

/// Real delay on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        sleep(delay).await;
    }
}

/// Production transport built on a shared `reqwest::Client`.
///
/// Follows redirects (reqwest's default policy) and sends the configured
/// browser headers on every request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client from `options`.
    ///
    /// # Errors
    ///
    /// Fails if a header value is not valid ASCII or the TLS backend cannot
    /// be initialised.
    pub fn new(options: &FetchOptions) -> Result<Self, FetchFailure> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&options.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&options.accept_language)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchFailure> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchFailure::Transport(format!("invalid header value {value:?}: {e}")))
}

impl Transport for ReqwestTransport {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &Url) -> Result<RawResponse, FetchFailure> {
        let resp = self.client.get(url.clone()).send().await?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;

        debug!(status, bytes = body.len(), %final_url, "Received response");
        Ok(RawResponse {
            final_url,
            status,
            content_type,
            body,
        })
    }
}

/// Wrapper that adds linear backoff retry logic to any [`Transport`].
///
/// # Backoff Strategy
///
/// ```text
/// delay(attempt) = backoff_step * attempt      (attempt = 1, 2, ...)
/// ```
pub struct RetryFetch<T, S = TokioSleeper> {
    /// The underlying transport to wrap.
    inner: T,
    /// What to wait on between attempts.
    sleeper: S,
    /// Total attempts before giving up (never below 1).
    max_attempts: usize,
    /// Delay unit, multiplied by the attempt number.
    backoff_step: Duration,
}

impl<T: Transport> RetryFetch<T, TokioSleeper> {
    /// Wrap `inner` with the attempt count and backoff from `options`.
    pub fn new(inner: T, options: &FetchOptions) -> Self {
        Self::with_sleeper(inner, TokioSleeper, options)
    }
}

impl<T: Transport, S: Sleeper> RetryFetch<T, S> {
    pub fn with_sleeper(inner: T, sleeper: S, options: &FetchOptions) -> Self {
        Self {
            inner,
            sleeper,
            max_attempts: options.max_attempts.max(1),
            backoff_step: options.backoff_step,
        }
    }

    /// The delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        self.backoff_step
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }

    /// Fetch `url`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// [`ExtractError::Fetch`] carrying the last failure once every attempt
    /// has failed.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchResult, ExtractError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            let outcome = self.inner.get(url).await.and_then(check_status);

            match outcome {
                Ok(result) => {
                    info!(
                        attempt,
                        status = result.status,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "fetch succeeded"
                    );
                    return Ok(result);
                }
                Err(cause) => {
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis();
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt,
                            elapsed_ms_total,
                            error = %cause,
                            "fetch exhausted retries"
                        );
                        return Err(ExtractError::Fetch {
                            attempts: attempt,
                            cause,
                        });
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        ?delay,
                        error = %cause,
                        "fetch attempt failed; backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}

impl<T, S> fmt::Debug for RetryFetch<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step", &self.backoff_step)
            .finish()
    }
}

fn check_status(resp: RawResponse) -> Result<FetchResult, FetchFailure> {
    if !(200..300).contains(&resp.status) {
        return Err(FetchFailure::Status {
            status: resp.status,
            url: resp.final_url,
        });
    }
    Ok(FetchResult {
        final_url: resp.final_url,
        status: resp.status,
        content_type: resp.content_type,
        body: resp.body,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn target() -> Url {
        Url::parse("https://ex.com/").unwrap()
    }

    fn net_err() -> Result<RawResponse, FetchFailure> {
        Err(FetchFailure::Transport("connection refused".into()))
    }

    #[tokio::test]
    async fn test_gives_up_after_exactly_three_attempts() {
        let transport = ScriptedTransport::new(vec![net_err(), net_err(), net_err(), net_err()]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &FetchOptions::default());

        let err = fetcher.fetch(&target()).await.unwrap_err();
        match err {
            ExtractError::Fetch { attempts, cause } => {
                assert_eq!(attempts, 3);
                assert_eq!(cause, FetchFailure::Transport("connection refused".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_backoff_is_linear_and_skips_final_wait() {
        let transport = ScriptedTransport::new(vec![net_err(), net_err(), net_err()]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &FetchOptions::default());

        let _ = fetcher.fetch(&target()).await;
        assert_eq!(
            *sleeper.delays.borrow(),
            vec![Duration::from_millis(800), Duration::from_millis(1600)]
        );
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchFailure::Timeout),
            Ok(status_response("https://ex.com/", 503)),
            Ok(ok_response("https://ex.com/", "text/html", "<p>hi</p>")),
        ]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &FetchOptions::default());

        let result = fetcher.fetch(&target()).await.unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body, "<p>hi</p>");
        assert_eq!(transport.calls(), 3);
        assert_eq!(sleeper.delays.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_non_success_status_is_the_reported_cause() {
        let transport = ScriptedTransport::new(vec![
            Ok(status_response("https://ex.com/", 500)),
            Ok(status_response("https://ex.com/", 502)),
            Ok(status_response("https://ex.com/gone", 404)),
        ]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &FetchOptions::default());

        match fetcher.fetch(&target()).await {
            Err(ExtractError::Fetch { cause, .. }) => assert_eq!(
                cause,
                FetchFailure::Status {
                    status: 404,
                    url: "https://ex.com/gone".into()
                }
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_success_makes_single_call() {
        let transport =
            ScriptedTransport::new(vec![Ok(ok_response("https://ex.com/", "text/html", "x"))]);
        let sleeper = RecordingSleeper::default();
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &FetchOptions::default());

        fetcher.fetch(&target()).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert!(sleeper.delays.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_zero_attempts_is_clamped_to_one() {
        let transport = ScriptedTransport::new(vec![net_err(), net_err()]);
        let sleeper = RecordingSleeper::default();
        let options = FetchOptions {
            max_attempts: 0,
            ..FetchOptions::default()
        };
        let fetcher = RetryFetch::with_sleeper(&transport, &sleeper, &options);

        assert!(fetcher.fetch(&target()).await.is_err());
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.timeout, Duration::from_secs(20));
        assert!(options.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(options.accept_language, "en-US,en;q=0.9");
    }

    #[test]
    fn test_reqwest_transport_rejects_bad_header() {
        let options = FetchOptions {
            user_agent: "bad\nagent".into(),
            ..FetchOptions::default()
        };
        assert!(matches!(
            ReqwestTransport::new(&options),
            Err(FetchFailure::Transport(_))
        ));
    }
}
