//! Fail-fast, cancellable draining of per-chunk transfer tasks.

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// Await every task in `tasks`, handing each successful result to `on_ok`.
///
/// Returns at the first task error, `on_ok` error, or cancellation. Any
/// tasks still running at that point are aborted.
pub(crate) async fn drain<T, F>(
    tasks: &mut JoinSet<Result<T, EngineError>>,
    cancel: &CancellationToken,
    mut on_ok: F,
) -> Result<(), EngineError>
where
    T: Send + 'static,
    F: FnMut(T) -> Result<(), EngineError>,
{
    let result = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(EngineError::Cancelled),
            next = tasks.join_next() => match next {
                None => break Ok(()),
                Some(Ok(Ok(value))) => {
                    if let Err(e) = on_ok(value) {
                        break Err(e);
                    }
                }
                Some(Ok(Err(e))) => break Err(e),
                Some(Err(join_err)) => break Err(EngineError::Computation(join_err.to_string())),
            },
        }
    };

    if result.is_err() {
        tasks.abort_all();
    }
    result
}
