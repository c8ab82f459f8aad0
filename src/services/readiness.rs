//! Startup readiness polling for backing services

use std::{future::Future, time::Duration};

use tokio::time::{sleep, Instant};

use crate::error::{AppError, AppResult};

/// Poll `probe` every `interval` until it succeeds or `timeout` has elapsed
pub async fn wait_until_ready<F, Fut>(
    name: &str,
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let last_error = match tokio::time::timeout_at(deadline, probe()).await {
            Ok(Ok(())) => {
                tracing::info!(service = name, attempts, "Service ready");
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "probe timed out".to_string(),
        };

        if Instant::now() + interval > deadline {
            tracing::error!(service = name, attempts, "Service not ready: {}", last_error);
            return Err(AppError::ServiceUnavailable(format!(
                "{} not ready after {:?}: {}",
                name, timeout, last_error
            )));
        }

        tracing::debug!(service = name, attempts, "Waiting for service: {}", last_error);
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        wait_until_ready("postgres", Duration::from_millis(5), Duration::from_secs(5), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::Internal("connection refused".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_at_deadline() {
        let err = wait_until_ready("redis", Duration::from_millis(10), Duration::from_millis(50), || async {
            Err(AppError::Internal("connection refused".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn hanging_probe_is_bounded() {
        let err = wait_until_ready("redis", Duration::from_millis(10), Duration::from_millis(50), || {
            std::future::pending::<AppResult<()>>()
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }
}
