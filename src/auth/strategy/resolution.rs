//! Single-shot token resolution.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Completion handle a strategy holds until a pending resolution settles.
pub(crate) type ResolutionWaiter = oneshot::Sender<Option<String>>;

/// The asynchronous act of producing an access token from a strategy.
///
/// Settles exactly once: `Some(token)` when the strategy holds a usable
/// credential, `None` when it does not (unauthenticated, deauthorized,
/// superseded, or a failed exchange). Dropping the producing strategy also
/// settles the resolution with `None`, so a caller can never hang on it.
#[derive(Debug)]
pub struct TokenResolution {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Ready(Option<String>),
    Pending(oneshot::Receiver<Option<String>>),
}

impl TokenResolution {
    /// Resolution that settles immediately.
    pub(crate) fn ready(token: Option<String>) -> Self {
        Self {
            inner: Inner::Ready(token),
        }
    }

    /// Resolution settled later through the returned waiter.
    pub(crate) fn pending() -> (ResolutionWaiter, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                inner: Inner::Pending(rx),
            },
        )
    }
}

impl Future for TokenResolution {
    type Output = Option<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            Inner::Ready(token) => Poll::Ready(token.take()),
            Inner::Pending(rx) => Pin::new(rx).poll(cx).map(|res| res.unwrap_or(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_some() {
        let resolution = TokenResolution::ready(Some("abc123".into()));
        assert_eq!(resolution.await, Some("abc123".to_string()));
    }

    #[tokio::test]
    async fn test_ready_none() {
        let resolution = TokenResolution::ready(None);
        assert_eq!(resolution.await, None);
    }

    #[tokio::test]
    async fn test_pending_settles_once_waiter_fires() {
        let (waiter, resolution) = TokenResolution::pending();
        let handle = tokio::spawn(resolution);
        waiter.send(Some("tok".into())).unwrap();
        assert_eq!(handle.await.unwrap(), Some("tok".to_string()));
    }

    #[test]
    fn test_stays_pending_until_settled() {
        let (waiter, resolution) = TokenResolution::pending();
        let mut task = tokio_test::task::spawn(resolution);

        tokio_test::assert_pending!(task.poll());
        waiter.send(None).unwrap();
        assert_eq!(task.poll(), std::task::Poll::Ready(None));
    }

    #[tokio::test]
    async fn test_dropped_waiter_reads_as_none() {
        let (waiter, resolution) = TokenResolution::pending();
        drop(waiter);
        assert_eq!(resolution.await, None);
    }
}
