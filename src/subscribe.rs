//! Push-style consumption of a stream.
//!
//! [`Stream`](futures_core::Stream) is pull based: a consumer polls for each
//! item. Some consumers are more naturally written as a [`Subscriber`] which
//! is handed items and a final [`Completion`]. [`SubscribeExt::subscribe`]
//! bridges the two with a [`Subscription`] future that drives the stream.
//!
//! Dropping the [`Subscription`] before it resolves cancels it. The stream is
//! dropped and the subscriber receives no completion.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::TryStream;
use pin_project::pin_project;

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<E> {
    /// The stream ran out of items.
    Finished,

    /// The stream failed.
    Failure(E),
}

impl<E> Completion<E> {
    /// Map the failure, if any.
    pub fn map_failure<F, E2>(self, f: F) -> Completion<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Completion::Finished => Completion::Finished,
            Completion::Failure(error) => Completion::Failure(f(error)),
        }
    }

    /// Convert into a [`Result`].
    pub fn into_result(self) -> Result<(), E> {
        match self {
            Completion::Finished => Ok(()),
            Completion::Failure(error) => Err(error),
        }
    }
}

/// Receives the items of a stream, then how the stream ended.
pub trait Subscriber<T, E> {
    /// Called once for each successful item, in order.
    fn receive(&mut self, item: T);

    /// Called exactly once, after the last item.
    fn receive_completion(&mut self, completion: Completion<E>);
}

impl<T, E, S> Subscriber<T, E> for &mut S
where
    S: Subscriber<T, E> + ?Sized,
{
    fn receive(&mut self, item: T) {
        (**self).receive(item)
    }

    fn receive_completion(&mut self, completion: Completion<E>) {
        (**self).receive_completion(completion)
    }
}

/// Create a [`Subscriber`] from a pair of closures.
pub fn subscriber_fn<R, C>(receive: R, complete: C) -> SubscriberFn<R, C> {
    SubscriberFn { receive, complete }
}

/// A [`Subscriber`] made of closures, see [`subscriber_fn`].
#[derive(Clone)]
pub struct SubscriberFn<R, C> {
    receive: R,
    complete: C,
}

impl<R, C> fmt::Debug for SubscriberFn<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberFn").finish()
    }
}

impl<T, E, R, C> Subscriber<T, E> for SubscriberFn<R, C>
where
    R: FnMut(T),
    C: FnMut(Completion<E>),
{
    fn receive(&mut self, item: T) {
        (self.receive)(item)
    }

    fn receive_completion(&mut self, completion: Completion<E>) {
        (self.complete)(completion)
    }
}

/// Future for [`SubscribeExt::subscribe`].
///
/// Resolves to the subscriber once the stream has ended.
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Subscription<S, Sub> {
    #[pin]
    stream: S,
    subscriber: Option<Sub>,
}

impl<S: fmt::Debug, Sub> fmt::Debug for Subscription<S, Sub> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("stream", &self.stream)
            .field("completed", &self.subscriber.is_none())
            .finish()
    }
}

impl<S, Sub> Future for Subscription<S, Sub>
where
    S: TryStream,
    Sub: Subscriber<S::Ok, S::Error>,
{
    type Output = Sub;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        loop {
            let completion = match ready!(this.stream.as_mut().try_poll_next(cx)) {
                Some(Ok(item)) => {
                    this.subscriber
                        .as_mut()
                        .expect("subscription polled after completion")
                        .receive(item);
                    continue;
                }
                Some(Err(error)) => {
                    tracing::trace!("subscription failed");
                    Completion::Failure(error)
                }
                None => {
                    tracing::trace!("subscription finished");
                    Completion::Finished
                }
            };

            let mut subscriber = this
                .subscriber
                .take()
                .expect("subscription polled after completion");
            subscriber.receive_completion(completion);
            return Poll::Ready(subscriber);
        }
    }
}

/// Extension trait to drive a stream into a [`Subscriber`].
pub trait SubscribeExt: TryStream {
    /// Subscribe to this stream.
    ///
    /// Nothing happens until the returned future is polled.
    fn subscribe<Sub>(self, subscriber: Sub) -> Subscription<Self, Sub>
    where
        Self: Sized,
        Sub: Subscriber<Self::Ok, Self::Error>,
    {
        Subscription {
            stream: self,
            subscriber: Some(subscriber),
        }
    }
}

impl<S: TryStream + ?Sized> SubscribeExt for S {}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_util::{stream, FutureExt as _};
    use static_assertions::assert_impl_all;

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        items: Vec<u8>,
        completions: Vec<Completion<String>>,
    }

    impl Subscriber<u8, String> for Recorder {
        fn receive(&mut self, item: u8) {
            self.items.push(item);
        }

        fn receive_completion(&mut self, completion: Completion<String>) {
            self.completions.push(completion);
        }
    }

    assert_impl_all!(Subscription<stream::Empty<Result<u8, String>>, Recorder>: Future, Send, Unpin);

    #[tokio::test]
    async fn delivers_items_then_finished() {
        let recorder = stream::iter([Ok(1u8), Ok(2)])
            .subscribe(Recorder::default())
            .await;
        assert_eq!(recorder.items, vec![1, 2]);
        assert_eq!(recorder.completions, vec![Completion::Finished]);
    }

    #[tokio::test]
    async fn failure_ends_subscription() {
        let recorder = stream::iter([Ok(1u8), Err("boom".to_owned()), Ok(3)])
            .subscribe(Recorder::default())
            .await;
        assert_eq!(recorder.items, vec![1]);
        assert_eq!(
            recorder.completions,
            vec![Completion::Failure("boom".to_owned())]
        );
    }

    #[tokio::test]
    async fn subscriber_by_reference() {
        let mut recorder = Recorder::default();
        stream::iter([Ok::<_, String>(5u8)])
            .subscribe(&mut recorder)
            .await;
        assert_eq!(recorder.items, vec![5]);
    }

    #[test]
    fn cancel_before_completion() {
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        let subscriber = subscriber_fn(
            |_: u8| {},
            move |_: Completion<Infallible>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let mut subscription = stream::pending::<Result<u8, Infallible>>().subscribe(subscriber);
        assert!((&mut subscription).now_or_never().is_none());
        drop(subscription);
        assert_eq!(completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn completion_into_result() {
        assert_eq!(Completion::<u8>::Finished.into_result(), Ok(()));
        assert_eq!(
            Completion::Failure(3u8).map_failure(u16::from).into_result(),
            Err(3u16)
        );
    }
}
