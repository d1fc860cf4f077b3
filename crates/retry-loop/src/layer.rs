//! Tower adapter that polls a service until it reports completion.

use crate::{LoopError, RetryLoop};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::layer::Layer;
use tower::{Service, ServiceExt};

/// A Tower layer that re-issues a request until the inner service answers `true`.
///
/// The inner service answers "done yet?" for a request, e.g. a lock store's
/// try-acquire. `Ok(false)` means try again, `Ok(true)` ends the loop and
/// any error ends it immediately. Polling is bounded by the loop's timeout.
///
/// # Examples
///
/// ```
/// use retry_loop::{RetryLoop, RetryLoopLayer, Timeout};
/// use tower::{Layer, Service, ServiceExt, service_fn};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let layer = RetryLoopLayer::new(RetryLoop::new(Timeout::from_secs(3))?);
///
/// let mut svc = layer.layer(service_fn(|key: &'static str| async move {
///     Ok::<_, std::io::Error>(!key.is_empty())
/// }));
///
/// let polls = svc.ready().await?.call("lock:orders").await?;
/// assert_eq!(polls, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryLoopLayer {
    retry_loop: RetryLoop,
}

impl RetryLoopLayer {
    /// Creates a layer that drives requests with `retry_loop`.
    pub fn new(retry_loop: RetryLoop) -> Self {
        Self { retry_loop }
    }
}

impl From<RetryLoop> for RetryLoopLayer {
    fn from(retry_loop: RetryLoop) -> Self {
        Self::new(retry_loop)
    }
}

impl<S> Layer<S> for RetryLoopLayer {
    type Service = PollUntil<S>;

    fn layer(&self, service: S) -> Self::Service {
        PollUntil {
            inner: service,
            retry_loop: self.retry_loop.clone(),
        }
    }
}

/// Service produced by [`RetryLoopLayer`].
///
/// Responds with the number of times the inner service was called.
#[derive(Debug, Clone)]
pub struct PollUntil<S> {
    inner: S,
    retry_loop: RetryLoop,
}

impl<S, Req> Service<Req> for PollUntil<S>
where
    S: Service<Req, Response = bool> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    Req: Clone + Send + 'static,
{
    type Response = usize;
    type Error = LoopError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(LoopError::Work)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        let retry_loop = self.retry_loop.clone();

        Box::pin(async move {
            let polls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&polls);

            retry_loop
                .execute(move |control| {
                    let mut svc = inner.clone();
                    let req = req.clone();
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.store(control.iteration(), Ordering::Release);
                        if svc.ready().await?.call(req).await? {
                            control.stop();
                        }
                        Ok(())
                    }
                })
                .await?;

            Ok(polls.load(Ordering::Acquire))
        })
    }
}
