//! Readiness detection for a freshly spawned backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Liveness path served by the backend.
pub const HEALTH_PATH: &str = "/health";

/// Delay between two readiness attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Budget for a freshly spawned backend to become ready.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(40_000);

/// Upper bound on a single liveness request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// One liveness attempt.
///
/// Implementations never fail: anything other than a healthy answer is
/// reported as `false`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}

/// `GET http://127.0.0.1:<port>/health`, healthy on any 2xx.
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthCheck {
    pub fn new(port: u16) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            url: format!("http://127.0.0.1:{port}{HEALTH_PATH}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Health check not successful");
                false
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Health check failed");
                false
            }
        }
    }
}

/// Polls a `HealthCheck` at a fixed interval until it succeeds or time runs out.
#[derive(Clone)]
pub struct ReadinessProbe {
    check: Arc<dyn HealthCheck>,
    interval: Duration,
}

impl ReadinessProbe {
    pub fn new(check: Arc<dyn HealthCheck>) -> Self {
        Self {
            check,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Wait until the backend answers or `timeout` has elapsed.
    ///
    /// No backoff: attempts are spaced by the fixed interval. Neither a slow
    /// attempt nor the pause after it runs past the deadline.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let started = Instant::now();
        let remaining = || timeout.saturating_sub(started.elapsed());
        let mut attempt = 0u32;

        while !remaining().is_zero() {
            attempt += 1;
            let healthy = tokio::time::timeout(remaining(), self.check.check())
                .await
                .unwrap_or(false);
            if healthy {
                info!(
                    attempt = %attempt,
                    elapsed_ms = %started.elapsed().as_millis(),
                    "Backend is ready"
                );
                return true;
            }
            debug!(attempt = %attempt, "Backend not ready yet");
            sleep(self.interval.min(remaining())).await;
        }

        info!(attempts = %attempt, timeout_ms = %timeout.as_millis(), "Backend readiness timed out");
        false
    }
}

impl std::fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessProbe")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Healthy from the `succeed_on`th attempt onwards.
    struct CountingCheck {
        attempts: AtomicU32,
        succeed_on: Option<u32>,
    }

    impl CountingCheck {
        fn new(succeed_on: Option<u32>) -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicU32::new(0),
                succeed_on,
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthCheck for CountingCheck {
        async fn check(&self) -> bool {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.succeed_on.is_some_and(|n| attempt >= n)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_polls_three_times_in_1500ms() {
        let check = CountingCheck::new(None);
        let probe = ReadinessProbe::new(check.clone());

        let started = Instant::now();
        let ready = probe.wait(Duration::from_millis(1500)).await;

        assert!(!ready);
        assert_eq!(check.attempts(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_nth_poll_returns_within_n_intervals() {
        let check = CountingCheck::new(Some(4));
        let probe = ReadinessProbe::new(check.clone());

        let started = Instant::now();
        let ready = probe.wait(DEFAULT_READY_TIMEOUT).await;

        assert!(ready);
        assert_eq!(check.attempts(), 4);
        assert!(started.elapsed() <= DEFAULT_POLL_INTERVAL * 4);
    }

    /// Never answers.
    struct HangingCheck;

    #[async_trait]
    impl HealthCheck for HangingCheck {
        async fn check(&self) -> bool {
            sleep(Duration::from_secs(60)).await;
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempt_is_cut_at_the_deadline() {
        let probe = ReadinessProbe::new(Arc::new(HangingCheck));

        let started = Instant::now();
        assert!(!probe.wait(Duration::from_millis(1500)).await);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_is_shortened_to_the_deadline() {
        let check = CountingCheck::new(None);
        let probe = ReadinessProbe::new(check.clone());

        let started = Instant::now();
        assert!(!probe.wait(Duration::from_millis(1200)).await);
        assert_eq!(check.attempts(), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_polls() {
        let check = CountingCheck::new(Some(1));
        let probe = ReadinessProbe::new(check.clone());

        assert!(!probe.wait(Duration::ZERO).await);
        assert_eq!(check.attempts(), 0);
    }

    async fn serve_health(status: StatusCode) -> u16 {
        let app = Router::new().route(HEALTH_PATH, get(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn http_check_accepts_2xx() {
        let port = serve_health(StatusCode::NO_CONTENT).await;
        let check = HttpHealthCheck::new(port).unwrap();
        assert!(check.check().await);
    }

    #[tokio::test]
    async fn http_check_rejects_server_error() {
        let port = serve_health(StatusCode::SERVICE_UNAVAILABLE).await;
        let check = HttpHealthCheck::new(port).unwrap();
        assert!(!check.check().await);
    }

    #[tokio::test]
    async fn http_check_treats_refused_connection_as_not_ready() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let check = HttpHealthCheck::new(port).unwrap();
        assert!(check.url().ends_with("/health"));
        assert!(!check.check().await);
    }
}
