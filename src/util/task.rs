use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Wraps a future to catch panics and convert them to errors.
///
/// Spawned tasks report their outcome over a channel; a task that panics
/// would otherwise vanish without ever reporting, leaving its control stuck
/// in a busy state. This turns the panic payload into a message instead.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
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
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}
