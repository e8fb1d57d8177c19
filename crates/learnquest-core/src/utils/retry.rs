use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(3, Duration::from_millis(500))
    }
}

impl RetryConfig {
    /// Same delay between every attempt, no jitter.
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff: delay,
            max_backoff: delay,
            jitter_max: None,
        }
    }

    /// Doubling backoff with up to half a step of random jitter.
    pub fn exponential(max_attempts: usize, base: Duration) -> Self {
        Self {
            max_attempts,
            base_backoff: base,
            max_backoff: base * 16,
            jitter_max: Some(base / 2),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::fixed(
            config.retry_attempts.max(1),
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

pub async fn retry_async_with_config<F, Fut, T, E>(config: RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts_left = config.max_attempts.max(1);
    let mut attempt = 0usize;
    let mut backoff = config.base_backoff;

    loop {
        attempt += 1;
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 {
                    tracing::warn!("Giving up after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }

                tracing::debug!("Attempt {} failed ({}), retrying in {:?}", attempt, e, backoff);

                // apply jitter
                if let Some(jitter_max) = config.jitter_max {
                    let jitter_ms = jitter_max.as_millis() as u64;
                    let extra = if jitter_ms == 0 {
                        0
                    } else {
                        rand::random::<u64>() % (jitter_ms + 1)
                    };
                    tokio::time::sleep(backoff + Duration::from_millis(extra)).await;
                } else {
                    tokio::time::sleep(backoff).await;
                }

                backoff = std::cmp::min(backoff * 2, config.max_backoff);
            }
        }
    }
}
