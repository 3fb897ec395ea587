//! Backoff for peer queries.
//!
//! `evaluate` is read-only, so a query whose request never reached the peer
//! can be sent again. Anything the peer answered (any status) is final.

use std::future::Future;
use std::time::Duration;

/// How often, and how patiently, a query is re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    /// Re-sends after the first attempt.
    pub retries: u32,
    /// Delay before the first re-send; doubles each time.
    pub first_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            retries: 3,
            first_delay: Duration::from_millis(200),
        }
    }
}

impl Backoff {
    /// Waits between attempts, in order.
    pub(crate) fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.retries).map(|n| self.first_delay * 2u32.pow(n))
    }

    /// Run `attempt` until it succeeds or the re-sends are used up.
    ///
    /// The last error is returned unchanged.
    pub(crate) async fn run<T, E, F, Fut>(&self, query: &str, attempt: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        for (n, delay) in self.delays().enumerate() {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        query,
                        retry = n + 1,
                        of = self.retries,
                        ?delay,
                        error = %e,
                        "peer unreachable, re-sending query"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        attempt().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant(retries: u32) -> Backoff {
        Backoff {
            retries,
            first_delay: Duration::ZERO,
        }
    }

    #[test]
    fn default_waits_double() {
        let waits: Vec<_> = Backoff::default().delays().map(|d| d.as_millis()).collect();
        assert_eq!(waits, [200, 400, 800]);
    }

    #[tokio::test]
    async fn gives_up_after_every_retry() {
        let sent = AtomicU32::new(0);
        let result: Result<(), String> = instant(3)
            .run("GetBalance", || async {
                sent.fetch_add(1, Ordering::SeqCst);
                Err("connection refused".to_string())
            })
            .await;
        assert_eq!(result.unwrap_err(), "connection refused");
        assert_eq!(sent.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn stops_at_the_first_answer() {
        let sent = AtomicU32::new(0);
        let result: Result<u32, String> = instant(3)
            .run("TotalSupply", || async {
                let n = sent.fetch_add(1, Ordering::SeqCst);
                if n < 1 {
                    Err("timed out".to_string())
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_retries_sends_once() {
        let sent = AtomicU32::new(0);
        let _: Result<(), &str> = instant(0)
            .run("GetModel", || async {
                sent.fetch_add(1, Ordering::SeqCst);
                Err("down")
            })
            .await;
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }
}
