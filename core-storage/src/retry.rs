//! Time-bounded, retrying object store wrapper

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::RetryPolicy,
    object_store::{ContentAddress, ObjectStore},
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Wraps an [`ObjectStore`] so that retrieval cannot hang forever.
///
/// Each `get` attempt is bounded by `attempt_timeout`; timeouts and other
/// transient failures are retried according to the [`RetryPolicy`].
/// `NotFound` is returned immediately. `put` is passed through untouched
/// since stores are not required to make writes idempotent under retry.
pub struct RetryingObjectStore {
    inner: Arc<dyn ObjectStore>,
    attempt_timeout: Duration,
    policy: RetryPolicy,
}

impl RetryingObjectStore {
    pub fn new(inner: Arc<dyn ObjectStore>, attempt_timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            inner,
            attempt_timeout,
            policy,
        }
    }

    async fn get_once(&self, address: &ContentAddress) -> Result<Bytes> {
        match timeout(self.attempt_timeout, self.inner.get(address)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(format!(
                "get {} exceeded {:?}",
                address, self.attempt_timeout
            ))),
        }
    }
}

#[async_trait]
impl ObjectStore for RetryingObjectStore {
    async fn put(&self, data: Bytes) -> Result<ContentAddress> {
        self.inner.put(data).await
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.get_once(address).await {
                Ok(data) => {
                    if attempt > 1 {
                        debug!(%address, attempt, "Blob retrieved after retry");
                    }
                    return Ok(data);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(%address, attempt, error = %err, ?delay, "Retrying blob retrieval");
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn contains(&self, address: &ContentAddress) -> Result<bool> {
        self.inner.contains(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` gets with the error produced by `make_error`,
    /// then hangs or succeeds.
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        hang: bool,
        make_error: fn() -> BridgeError,
    }

    impl FlakyStore {
        fn new(failures: u32, make_error: fn() -> BridgeError) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                hang: false,
                make_error,
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::new(0, || BridgeError::OperationFailed("unused".into()))
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        async fn put(&self, _data: Bytes) -> Result<ContentAddress> {
            ContentAddress::new("stored")
        }

        async fn get(&self, _address: &ContentAddress) -> Result<Bytes> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if call < self.failures {
                Err((self.make_error)())
            } else {
                Ok(Bytes::from_static(b"blob"))
            }
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            use_exponential_backoff: true,
        }
    }

    fn address() -> ContentAddress {
        ContentAddress::new("bafkreiexample").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let inner = Arc::new(FlakyStore::new(2, || BridgeError::OperationFailed("503".into())));
        let store = RetryingObjectStore::new(inner.clone(), Duration::from_secs(1), policy(3));

        let data = store.get(&address()).await.unwrap();
        assert_eq!(data.as_ref(), b"blob");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let inner = Arc::new(FlakyStore::new(5, || BridgeError::NotFound("gone".into())));
        let store = RetryingObjectStore::new(inner.clone(), Duration::from_secs(1), policy(3));

        let err = store.get(&address()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyStore::new(10, || BridgeError::OperationFailed("503".into())));
        let store = RetryingObjectStore::new(inner.clone(), Duration::from_secs(1), policy(2));

        assert!(store.get(&address()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_get_times_out() {
        let inner = Arc::new(FlakyStore::hanging());
        let store = RetryingObjectStore::new(inner.clone(), Duration::from_millis(50), policy(2));

        let err = store.get(&address()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
