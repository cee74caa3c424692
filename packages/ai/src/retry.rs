//! Bounded retry combinator.
//!
//! Both transport failures and unparseable output are recovered the same
//! way: the whole operation is re-run, up to a fixed number of tries, with
//! no backoff between tries. The last error is returned once the budget is
//! spent.

use std::fmt::Display;
use std::future::Future;

/// Runs `op` until it succeeds or `max_tries` attempts have failed.
///
/// `op` receives the 1-based attempt number. A `max_tries` of zero is
/// treated as one.
///
/// # Errors
///
/// Returns the error from the final attempt.
pub async fn attempt<T, E, F, Fut>(label: &str, max_tries: u32, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_tries = max_tries.max(1);
    let mut try_number = 1;

    loop {
        match op(try_number).await {
            Ok(value) => {
                if try_number > 1 {
                    log::info!("{label}: succeeded on attempt {try_number}/{max_tries}");
                }
                return Ok(value);
            }
            Err(e) if try_number < max_tries => {
                log::warn!("{label}: attempt {try_number}/{max_tries} failed: {e}");
                try_number += 1;
                log::warn!("{label}: retry {try_number}/{max_tries}");
            }
            Err(e) => {
                log::error!("{label}: giving up after {max_tries} attempts: {e}");
                return Err(e);
            }
        }
    }
}
