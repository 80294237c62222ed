use std::{future::Future, time::Duration};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {0:?}")]
pub struct Elapsed(pub Duration);

pub trait FutureTimeoutExt: Future + Sized {
    /// Fail with [`Elapsed`] if the future does not finish within `duration`
    fn with_timeout(
        self,
        duration: Duration,
    ) -> impl Future<Output = Result<Self::Output, Elapsed>> + Send
    where
        Self: Send,
        Self::Output: Send,
    {
        async move {
            tokio::time::timeout(duration, self).await.map_err(|_| {
                debug!("future timed out after {duration:?}");
                Elapsed(duration)
            })
        }
    }

    /// Like [`Self::with_timeout`], `None` waits forever
    fn with_optional_timeout(
        self,
        duration: Option<Duration>,
    ) -> impl Future<Output = Result<Self::Output, Elapsed>> + Send
    where
        Self: Send,
        Self::Output: Send,
    {
        async move {
            match duration {
                Some(duration) => self.with_timeout(duration).await,
                None => Ok(self.await),
            }
        }
    }
}

impl<F: Future> FutureTimeoutExt for F {}
