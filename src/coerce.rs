//! Adaptors which change the failure type of a stream without touching its items.

use std::convert::Infallible;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::stream::FusedStream;
use futures_core::{Stream, TryStream};
use pin_project::pin_project;

use crate::failure::WidenInto;
use crate::private::Sealed;

/// Converts a failure of type `E` into the failure type `T`.
///
/// [`Widening`] follows the [`WidenInto`] rules, which need the source
/// failure to be registered but can lift [`Infallible`] into anything.
/// [`Converting`] uses [`Into`] and accepts any failure type.
pub trait Conversion<E, T>: Sealed {
    /// Convert one failure.
    fn convert(error: E) -> T;
}

/// [`Conversion`] through [`WidenInto`].
#[derive(Debug)]
pub enum Widening {}

/// [`Conversion`] through [`Into`].
#[derive(Debug)]
pub enum Converting {}

impl Sealed for Widening {}
impl Sealed for Converting {}

impl<E, T> Conversion<E, T> for Widening
where
    E: WidenInto<T>,
{
    #[inline]
    fn convert(error: E) -> T {
        error.widen()
    }
}

impl<E, T> Conversion<E, T> for Converting
where
    E: Into<T>,
{
    #[inline]
    fn convert(error: E) -> T {
        error.into()
    }
}

/// Stream for [`UnifiedStreamExt::widen_failure`](crate::UnifiedStreamExt::widen_failure).
///
/// Re-types each failure of the inner stream as `E`. Items pass through
/// unchanged, and failures are never dropped, retried or invented.
///
/// The inner failure type must implement [`WidenInto<E>`]. A stream which
/// fails with [`Infallible`] can always be widened, whatever `E` is.
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct WidenFailure<S, E> {
    #[pin]
    inner: S,
    failure: PhantomData<fn() -> E>,
}

impl<S, E> WidenFailure<S, E> {
    /// Wrap a stream, widening its failures into `E`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failure: PhantomData,
        }
    }

    /// Access a reference to the inner stream
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwrap the inner stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone, E> Clone for WidenFailure<S, E> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S: std::fmt::Debug, E> std::fmt::Debug for WidenFailure<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidenFailure")
            .field("inner", &self.inner)
            .field("failure", &std::any::type_name::<E>())
            .finish()
    }
}

impl<S, E> Stream for WidenFailure<S, E>
where
    S: TryStream,
    S::Error: WidenInto<E>,
{
    type Item = Result<S::Ok, E>;

    #[inline]
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project()
            .inner
            .try_poll_next(cx)
            .map(|item| item.map(|result| result.map_err(<S::Error as WidenInto<E>>::widen)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S, E> FusedStream for WidenFailure<S, E>
where
    S: TryStream + FusedStream,
    S::Error: WidenInto<E>,
{
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

/// Stream for [`NeverFailsExt::never_fails`] and
/// [`NeverFailsExt::never_fails_as`].
///
/// Presents a plain stream of items as a stream of `Ok` items whose failure
/// type is `E`. No failure is ever produced.
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct NeverFails<S, E = Infallible> {
    #[pin]
    inner: S,
    failure: PhantomData<fn() -> E>,
}

impl<S, E> NeverFails<S, E> {
    /// Wrap a stream which can't fail.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failure: PhantomData,
        }
    }

    /// Unwrap the inner stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Clone, E> Clone for NeverFails<S, E> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S: std::fmt::Debug, E> std::fmt::Debug for NeverFails<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeverFails")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<S: Stream, E> Stream for NeverFails<S, E> {
    type Item = Result<S::Item, E>;

    #[inline]
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx).map(|item| item.map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: FusedStream, E> FusedStream for NeverFails<S, E> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

/// Extension trait for lifting a plain [`Stream`] into one with a failure channel.
pub trait NeverFailsExt: Stream {
    /// Treat every item of this stream as a success, with [`Infallible`] as
    /// the failure type.
    fn never_fails(self) -> NeverFails<Self>
    where
        Self: Sized,
    {
        NeverFails::new(self)
    }

    /// Treat every item of this stream as a success, with `E` as the failure
    /// type.
    ///
    /// Use this for the never-failing arm of a branch with an explicit
    /// failure type, where `E` may be any type at all:
    ///
    /// ```
    /// use std::env::VarError;
    ///
    /// use confluence::branch::BranchBuilder;
    /// use confluence::NeverFailsExt as _;
    /// use futures_util::stream;
    ///
    /// let cached = true;
    /// let values = if cached {
    ///     let value = String::from("cached");
    ///     BranchBuilder::<VarError>::left(stream::iter([value]).never_fails_as::<VarError>())
    /// } else {
    ///     BranchBuilder::<VarError>::right(stream::iter([std::env::var("VALUE")]))
    /// };
    /// assert!(values.is_left());
    /// ```
    fn never_fails_as<E>(self) -> NeverFails<Self, E>
    where
        Self: Sized,
    {
        NeverFails::new(self)
    }
}

impl<S: Stream + ?Sized> NeverFailsExt for S {}

#[cfg(test)]
mod tests {
    use futures_util::{stream, StreamExt as _, TryStreamExt as _};
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::failure::BoxError;

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("upstream went away")]
    struct Gone;

    crate::concrete_failure!(Gone);

    assert_impl_all!(WidenFailure<stream::Empty<Result<(), Gone>>, BoxError>: Stream, Send, Sync, Unpin);
    assert_impl_all!(NeverFails<stream::Empty<u8>>: TryStream, FusedStream, Send, Unpin);
    assert_impl_all!(NeverFails<stream::Empty<u8>, std::env::VarError>: TryStream, Send, Sync, Unpin);
    assert_impl_all!(Widening: Conversion<Infallible, std::env::VarError>, Conversion<Gone, BoxError>);
    assert_impl_all!(Converting: Conversion<std::env::VarError, BoxError>, Conversion<std::env::VarError, std::env::VarError>);

    #[tokio::test]
    async fn never_fails_wraps_items_in_ok() {
        let items: Vec<u8> = stream::iter([1, 2, 3])
            .never_fails()
            .try_collect()
            .await
            .unwrap_or_else(|never: Infallible| match never {});
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn never_fails_as_any_failure_type() {
        let results: Vec<Result<u8, std::env::VarError>> =
            stream::iter([4, 5]).never_fails_as().collect().await;
        assert_eq!(results, vec![Ok(4), Ok(5)]);
    }

    #[tokio::test]
    async fn widen_never_into_concrete_emits_no_failure() {
        let widened = WidenFailure::<_, Gone>::new(stream::iter([7u8]).never_fails());
        let results: Vec<Result<u8, Gone>> = widened.collect().await;
        assert_eq!(results, vec![Ok(7)]);
    }

    #[tokio::test]
    async fn erased_failure_keeps_original() {
        let source = stream::iter([Ok(1u8), Err(Gone), Ok(2)]);
        let mut widened = WidenFailure::<_, BoxError>::new(source);

        assert_eq!(widened.next().await.map(|r| r.ok()), Some(Some(1)));
        let failure = widened
            .next()
            .await
            .expect("failure is forwarded")
            .expect_err("second item is a failure");
        assert_eq!(*failure.downcast::<Gone>().unwrap(), Gone);
        assert_eq!(widened.next().await.map(|r| r.ok()), Some(Some(2)));
        assert!(widened.next().await.is_none());
    }

    #[test]
    fn size_hint_is_forwarded() {
        let widened = WidenFailure::<_, BoxError>::new(stream::iter([Ok::<_, Gone>(1), Ok(2)]));
        assert_eq!(widened.size_hint(), (2, Some(2)));
    }
}
