//! Helper functions shared across the UI layer.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Braille spinner frames for the loading and refreshing indicators.
pub(super) const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Wraps a future to catch panics and convert them to errors.
///
/// A panic inside a spawned task would otherwise vanish into the runtime and
/// leave the screen waiting forever for a completion event. Converting it
/// lets the caller still report back.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(crate) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic payload".to_string()
            }
        })
}

pub(super) fn spinner_frame(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_value_through() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_captures_message() {
        let result = catch_task_panic(async {
            panic!("boom {}", 1);
        })
        .await;
        assert_eq!(result, Err::<(), _>("boom 1".to_string()));
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(spinner_frame(0), spinner_frame(SPINNER.len()));
    }
}
