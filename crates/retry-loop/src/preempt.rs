//! Racing a unit of work against the execution deadline.

use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::Sleep;

pin_project! {
    /// Drives `work` unless the deadline timer fires first.
    ///
    /// The timer is polled before the work on every wake-up, so a deadline
    /// that has elapsed wins over work that became ready at the same time.
    /// Resolves to `None` on timeout; the work future is then dropped by
    /// the caller, cancelling it at its current suspension point.
    pub(crate) struct Preempt<'a, F> {
        deadline: Option<Pin<&'a mut Sleep>>,
        #[pin]
        work: F,
    }
}

impl<'a, F> Preempt<'a, F> {
    pub(crate) fn new(deadline: Option<Pin<&'a mut Sleep>>, work: F) -> Self {
        Self { deadline, work }
    }
}

impl<F: Future> Future for Preempt<'_, F> {
    type Output = Option<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if let Some(deadline) = this.deadline.as_mut() {
            if deadline.as_mut().poll(cx).is_ready() {
                return Poll::Ready(None);
            }
        }
        this.work.poll(cx).map(Some)
    }
}
