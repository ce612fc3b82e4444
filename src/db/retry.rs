//! Bounded retry for store access.

/// Retry bound applied at the store boundary.
pub const MAX_ATTEMPTS: u32 = 5;

/// Run `op` up to `max_attempts` times, returning the first success or the
/// last error. No backoff; the retry applies only to store access, never to
/// in-memory aggregation.
pub fn with_retry<T, E, F>(max_attempts: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!("store query failed (attempt {attempt}/{max_attempts}): {err}");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_success_returns() {
        let mut calls = 0;
        let result: Result<i32, String> = with_retry(5, || {
            calls += 1;
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_recovers_within_bound() {
        let mut calls = 0;
        let result: Result<i32, String> = with_retry(5, || {
            calls += 1;
            if calls < 3 {
                Err("transient".to_string())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhaustion_propagates_last_error() {
        let mut calls = 0;
        let result: Result<i32, String> = with_retry(5, || {
            calls += 1;
            Err(format!("boom {calls}"))
        });
        assert_eq!(result.unwrap_err(), "boom 5");
        assert_eq!(calls, 5);
    }
}
