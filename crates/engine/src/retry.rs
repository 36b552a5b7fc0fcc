use std::future::Future;
use std::time::Duration;

use tracing::warn;

use common::Result;

/// Bounded retry with a slowly growing pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Pause after failed attempt `attempt` (0-based): `ceil(1 + attempt / 3)`
    /// seconds, i.e. 1, 2, 2, 2, 3, 3, 3, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(1 + u64::from(attempt).div_ceil(3))
    }

    /// Run `op` until it succeeds or `max_attempts` attempts have failed.
    /// Returns the last error on exhaustion. No pause follows the final
    /// failure.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        what,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
