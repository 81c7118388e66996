// ============================================================================
// SCHEDULER - timers and local task spawning behind one seam
// ============================================================================

use std::future::Future;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{select, Either, LocalBoxFuture};
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;

use crate::error::{ApiError, Result};

/// Pending timer. Dropping the handle cancels the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub trait Scheduler {
    /// Runs `task` once after `delay`, unless the handle is dropped first
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;

    /// Drives `future` to completion on the local event loop
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);

    /// Completes after `delay`. Dropping the future cancels the timer.
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        let (tx, rx) = oneshot::channel::<()>();
        let handle = self.schedule(
            delay,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        Box::pin(async move {
            let _handle = handle;
            let _ = rx.await;
        })
    }
}

/// Bounds `future` by `limit`; the loser of the race is dropped
pub async fn with_timeout<T, F>(scheduler: &dyn Scheduler, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match select(Box::pin(future), scheduler.sleep(limit)).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            log::warn!("⏳ Request exceeded {}s", limit.as_secs());
            Err(ApiError::Timeout)
        }
    }
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

/// Browser timers (gloo-timers) and `spawn_local`
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let timeout = Timeout::new(millis(delay), task);
        TimerHandle::new(move || drop(timeout))
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }

    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(TimeoutFuture::new(millis(delay)))
    }
}
