use std::{future::Future, time::Duration};

use tracing::{error, warn};

pub mod policies;

/// Runs a fallible async operation with a backoff retry.
///
/// Retries the given `operation` up to `max_retries` times, sleeping between
/// attempts for delays computed by the [`Backoff`] impl. Logs a warning on
/// each failure and an error once all retries are exhausted, returning the
/// last error.
///
/// # Example
///
/// ```rust
/// use altda_common::retry::{policies::ExponentialBackoff, retry_with_backoff_async};
///
/// async fn try_something() -> Result<(), &'static str> {
///     Err("failed to do something")
/// }
///
/// # async fn run() {
/// let result = retry_with_backoff_async(
///     "my_task",
///     3,
///     &ExponentialBackoff::new(500, 150, 100),
///     || try_something(),
/// )
/// .await;
/// # }
/// ```
pub async fn retry_with_backoff_async<R, E, F, Fut>(
    name: &str,
    max_retries: u16,
    backoff: &impl Backoff,
    operation: F,
) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: std::fmt::Debug,
{
    retry_with_backoff_inner(name, max_retries, backoff, operation, tokio::time::sleep).await
}

/// Inner method that actually does the retry which is generic on the sleep
/// function.
async fn retry_with_backoff_inner<R, E, F, Fut, S, SFut>(
    name: &str,
    max_retries: u16,
    backoff: &impl Backoff,
    mut operation: F,
    mut sleep_fn: S,
) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: std::fmt::Debug,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let mut delay = backoff.base_delay_ms();
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                warn!(%name, %attempt, ?err, %delay, "call failed, retrying");
                sleep_fn(Duration::from_millis(delay)).await;
                delay = backoff.next_delay_ms(delay);
            }
            Err(err) => {
                error!(%name, ?err, "max retries exceeded, returning with the last error");
                return Err(err);
            }
        }
    }
}

pub trait Backoff {
    /// Base delay in ms.
    fn base_delay_ms(&self) -> u64;

    /// Generates next delay given current delay.
    fn next_delay_ms(&self, curr_delay_ms: u64) -> u64;
}
