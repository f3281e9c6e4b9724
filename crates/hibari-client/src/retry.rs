use std::{fmt::Debug, future::Future};

/// Run a fallible confirmation routine with a bounded number of retries
///
/// The feed layer uses this with `max_retries = 1`: one retry, then the
/// failure is handed back to the caller to log and swallow.
pub async fn retry<F, Fut, T, E>(max_retries: u32, mut func: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Debug,
{
    let mut attempts_left = max_retries;
    loop {
        match func().await {
            Ok(val) => break Ok(val),
            Err(error) if attempts_left > 0 => {
                attempts_left -= 1;
                warn!(?error, attempts_left, "confirmation attempt failed");
            }
            Err(error) => break Err(error),
        }
    }
}

#[cfg(test)]
mod test {
    use super::retry;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stops_after_single_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry(1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("nope") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn succeeds_on_second_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(1, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err("transient")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }
}
