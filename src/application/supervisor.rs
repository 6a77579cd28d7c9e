//! Supervised background tasks

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Spawn a background task whose termination is always accounted for
///
/// The future carries its own outcome logging; this wrapper guarantees a
/// panic cannot vanish with the task.
pub fn spawn_supervised<F>(context: impl Into<String>, future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let context = context.into();
    tokio::spawn(async move {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(()) => debug!(task = %context, "supervised task finished"),
            Err(_) => error!(task = %context, "supervised task panicked"),
        }
    })
}
