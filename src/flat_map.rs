//! Flat-map whose callback may return unified branches.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::stream::FusedStream;
use futures_core::{Stream, TryStream};
use futures_util::stream::ErrInto;
use futures_util::TryStreamExt as _;
use pin_project::pin_project;

use crate::coerce::{Conversion, Converting, WidenFailure, Widening};
use crate::failure::{BoxError, Reconcile, WidenInto};

/// Stream for [`UnifiedStreamExt::flat_map_unified`].
///
/// Sub-streams are flattened one at a time, in the order their upstream items
/// arrived. The first failure, from upstream or from a sub-stream, is emitted
/// and then the stream ends.
///
/// Failures are converted into `E` with the [`Conversion`] `C`.
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct FlatMapUnified<St, F, U, E, C = Widening> {
    #[pin]
    upstream: St,
    f: F,
    #[pin]
    current: Option<U>,
    terminated: bool,
    failure: PhantomData<fn() -> (E, C)>,
}

impl<St, F, U, E, C> FlatMapUnified<St, F, U, E, C> {
    pub(crate) fn new(upstream: St, f: F) -> Self {
        Self {
            upstream,
            f,
            current: None,
            terminated: false,
            failure: PhantomData,
        }
    }
}

impl<St: fmt::Debug, F, U: fmt::Debug, E, C> fmt::Debug for FlatMapUnified<St, F, U, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMapUnified")
            .field("upstream", &self.upstream)
            .field("current", &self.current)
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl<St, F, U, E, C> Stream for FlatMapUnified<St, F, U, E, C>
where
    St: TryStream,
    F: FnMut(St::Ok) -> U,
    U: TryStream,
    C: Conversion<St::Error, E> + Conversion<U::Error, E>,
{
    type Item = Result<U::Ok, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.terminated {
            return Poll::Ready(None);
        }

        loop {
            if let Some(inner) = this.current.as_mut().as_pin_mut() {
                match ready!(inner.try_poll_next(cx)) {
                    Some(Ok(item)) => return Poll::Ready(Some(Ok(item))),
                    Some(Err(error)) => {
                        tracing::trace!("sub-stream failed, terminating");
                        this.current.set(None);
                        *this.terminated = true;
                        return Poll::Ready(Some(Err(
                            <C as Conversion<U::Error, E>>::convert(error),
                        )));
                    }
                    None => this.current.set(None),
                }
            }

            match ready!(this.upstream.as_mut().try_poll_next(cx)) {
                Some(Ok(item)) => {
                    tracing::trace!("starting sub-stream for upstream item");
                    let inner = (this.f)(item);
                    this.current.set(Some(inner));
                }
                Some(Err(error)) => {
                    tracing::trace!("upstream failed, terminating");
                    *this.terminated = true;
                    return Poll::Ready(Some(Err(
                        <C as Conversion<St::Error, E>>::convert(error),
                    )));
                }
                None => {
                    *this.terminated = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<St, F, U, E, C> FusedStream for FlatMapUnified<St, F, U, E, C>
where
    St: TryStream,
    F: FnMut(St::Ok) -> U,
    U: TryStream,
    C: Conversion<St::Error, E> + Conversion<U::Error, E>,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Extension methods for streams which can fail, i.e. any [`TryStream`].
pub trait UnifiedStreamExt: TryStream {
    /// Map each item to a sub-stream and flatten the sub-streams in order.
    ///
    /// The callback may return a different stream type for each arm of a
    /// conditional by building it with [`branch`](crate::branch). The
    /// failure types of this stream and the sub-streams are reconciled with
    /// [`Reconcile`], so a stream which can't fail may be flat-mapped into
    /// sub-streams that can, and vice versa.
    ///
    /// ```
    /// use confluence::{branch, NeverFailsExt as _, UnifiedStreamExt as _};
    /// use futures_util::{stream, StreamExt as _, TryStreamExt as _};
    ///
    /// # async fn run() -> Result<(), std::num::ParseIntError> {
    /// let numbers: Vec<u32> = stream::iter(["1", "two"])
    ///     .never_fails()
    ///     .flat_map_unified(|text| {
    ///         branch!(
    ///             if text.chars().all(|c| c.is_ascii_digit()) =>
    ///                 stream::once(async move { text.parse::<u32>() }),
    ///             else => stream::empty().never_fails(),
    ///         )
    ///     })
    ///     .try_collect()
    ///     .await?;
    /// assert_eq!(numbers, vec![1]);
    /// # Ok(())
    /// # }
    /// # let _ = run;
    /// ```
    fn flat_map_unified<F, U>(
        self,
        f: F,
    ) -> FlatMapUnified<Self, F, U, <Self::Error as Reconcile<U::Error>>::Output>
    where
        Self: Sized,
        F: FnMut(Self::Ok) -> U,
        U: TryStream,
        Self::Error: Reconcile<U::Error> + WidenInto<<Self::Error as Reconcile<U::Error>>::Output>,
        U::Error: WidenInto<<Self::Error as Reconcile<U::Error>>::Output>,
    {
        FlatMapUnified::new(self, f)
    }

    /// Like [`flat_map_unified`](UnifiedStreamExt::flat_map_unified), with an
    /// explicitly chosen failure type `E`.
    ///
    /// The failure types of this stream and the sub-streams only have to
    /// convert [`Into`] `E`, so they don't need to implement
    /// [`Failure`](crate::Failure). A never-failing side whose
    /// [`Infallible`](std::convert::Infallible) doesn't convert into `E` is
    /// lifted first with [`widen_failure`](UnifiedStreamExt::widen_failure)
    /// or [`never_fails_as`](crate::NeverFailsExt::never_fails_as).
    fn flat_map_unified_to<E, F, U>(self, f: F) -> FlatMapUnified<Self, F, U, E, Converting>
    where
        Self: Sized,
        F: FnMut(Self::Ok) -> U,
        U: TryStream,
        Self::Error: Into<E>,
        U::Error: Into<E>,
    {
        FlatMapUnified::new(self, f)
    }

    /// Widen the failure type of this stream into `E`.
    ///
    /// This is the coercion [`branch`](crate::branch) applies to each arm. A
    /// stream which fails with [`Infallible`](std::convert::Infallible) can
    /// be widened into any `E` at all.
    fn widen_failure<E>(self) -> WidenFailure<Self, E>
    where
        Self: Sized,
        Self::Error: WidenInto<E>,
    {
        WidenFailure::new(self)
    }

    /// Erase the failure type of this stream into a [`BoxError`].
    fn erase_failure(self) -> ErrInto<Self, BoxError>
    where
        Self: Sized,
        Self::Error: Into<BoxError>,
    {
        self.err_into()
    }
}

impl<S: TryStream + ?Sized> UnifiedStreamExt for S {}
