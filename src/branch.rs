//! Build a single stream type out of the arms of a conditional.
//!
//! Each arm of an `if` may produce a different stream type, as long as the
//! arms agree on their `Ok` item type. The failure types are reconciled with
//! [`Reconcile`], each arm is widened into the common failure type, and the
//! arms are tagged left or right by source position:
//!
//! ```
//! use confluence::{branch, BoxError, NeverFailsExt as _};
//! use futures_util::{stream, StreamExt as _, TryStreamExt as _};
//!
//! # async fn run(cached: bool) -> Result<Vec<u32>, BoxError> {
//! let numbers = if cached {
//!     branch::left(stream::iter([1, 2, 3]).never_fails())
//! } else {
//!     branch::right(stream::iter(["4", "5"]).map(|s| s.parse::<u32>()))
//! };
//!
//! // `Infallible` and `ParseIntError` reconcile to `ParseIntError`.
//! let numbers: Vec<u32> = numbers.try_collect().await?;
//! # Ok(numbers)
//! # }
//! # let _ = run;
//! ```
//!
//! [`either`] takes the arms as closures, so only the selected arm is ever
//! constructed. The [`branch!`](crate::branch!) macro nests [`either`] for
//! conditionals with more than two arms.
//!
//! Automatic reconciliation needs every failure type to implement
//! [`Failure`](crate::Failure). Arms which fail with an unregistered type,
//! such as an error from another crate, use one of the other entry points:
//!
//! - [`either_same`] when both arms already fail with the same type,
//! - [`BranchBuilder`] or [`either_erased`] to name the target type, which
//!   only requires [`Into`],
//! - [`either_typed`] to keep both failure types side by side.

use std::marker::PhantomData;

use futures_core::{Stream, TryStream};
use futures_util::stream::{self, Empty, ErrInto, MapErr};
use futures_util::TryStreamExt as _;

use crate::coerce::WidenFailure;
use crate::failure::{BoxError, EitherError, Reconcile, WidenInto};
use crate::unified::UnifiedStream;

/// The common failure type of two arms.
pub type Resolved<A, B> =
    <<A as TryStream>::Error as Reconcile<<B as TryStream>::Error>>::Output;

/// Two arms unified into the failure type picked by [`Reconcile`].
pub type Unified<A, B> =
    UnifiedStream<WidenFailure<A, Resolved<A, B>>, WidenFailure<B, Resolved<A, B>>>;

/// Two arms unified into the failure type `E` with [`Into`].
pub type UnifiedAs<A, B, E> = UnifiedStream<ErrInto<A, E>, ErrInto<B, E>>;

/// Tags the failures of one arm of [`UnifiedTyped`] with its side.
pub type Tag<S, L, R> = fn(<S as TryStream>::Error) -> EitherError<L, R>;

/// Two arms unified into an [`EitherError`] of their failure types.
pub type UnifiedTyped<A, B> = UnifiedStream<
    MapErr<A, Tag<A, <A as TryStream>::Error, <B as TryStream>::Error>>,
    MapErr<B, Tag<B, <A as TryStream>::Error, <B as TryStream>::Error>>,
>;

/// Select the first arm of a conditional.
///
/// The second arm's type is inferred from the other branch of the `if`.
pub fn left<A, B>(stream: A) -> Unified<A, B>
where
    A: TryStream,
    B: TryStream<Ok = A::Ok>,
    A::Error: Reconcile<B::Error> + WidenInto<Resolved<A, B>>,
    B::Error: WidenInto<Resolved<A, B>>,
{
    UnifiedStream::left(WidenFailure::new(stream))
}

/// Select the second arm of a conditional.
///
/// The first arm's type is inferred from the other branch of the `if`.
pub fn right<A, B>(stream: B) -> Unified<A, B>
where
    A: TryStream,
    B: TryStream<Ok = A::Ok>,
    A::Error: Reconcile<B::Error> + WidenInto<Resolved<A, B>>,
    B::Error: WidenInto<Resolved<A, B>>,
{
    UnifiedStream::right(WidenFailure::new(stream))
}

/// Evaluate one of two arms depending on `condition`.
///
/// Only the selected closure is called.
pub fn either<A, B, Then, Otherwise>(
    condition: bool,
    then: Then,
    otherwise: Otherwise,
) -> Unified<A, B>
where
    Then: FnOnce() -> A,
    Otherwise: FnOnce() -> B,
    A: TryStream,
    B: TryStream<Ok = A::Ok>,
    A::Error: Reconcile<B::Error> + WidenInto<Resolved<A, B>>,
    B::Error: WidenInto<Resolved<A, B>>,
{
    tracing::trace!(condition, "selecting branch");
    if condition {
        left(then())
    } else {
        right(otherwise())
    }
}

/// Evaluate one of two arms which share a failure type.
///
/// The arms are wrapped as they are, so the failure type doesn't need to
/// implement [`Failure`](crate::Failure).
///
/// ```
/// use std::env::VarError;
///
/// use confluence::branch;
/// use futures_util::stream;
///
/// let from_env = false;
/// let value = branch::either_same(
///     from_env,
///     || stream::iter([std::env::var("VALUE")]),
///     || stream::iter([Err::<String, _>(VarError::NotPresent)]),
/// );
/// assert!(value.is_right());
/// ```
pub fn either_same<A, B, Then, Otherwise>(
    condition: bool,
    then: Then,
    otherwise: Otherwise,
) -> UnifiedStream<A, B>
where
    Then: FnOnce() -> A,
    Otherwise: FnOnce() -> B,
    A: TryStream,
    B: TryStream<Ok = A::Ok, Error = A::Error>,
{
    tracing::trace!(condition, "selecting branch with shared failure");
    if condition {
        UnifiedStream::left(then())
    } else {
        UnifiedStream::right(otherwise())
    }
}

/// An `if` without an `else`: when `condition` is false the result is an
/// empty stream which completes immediately.
pub fn optional<A, Then>(condition: bool, then: Then) -> UnifiedStream<A, Empty<A::Item>>
where
    Then: FnOnce() -> A,
    A: Stream,
{
    tracing::trace!(condition, "selecting optional branch");
    if condition {
        UnifiedStream::left(then())
    } else {
        UnifiedStream::right(stream::empty())
    }
}

/// Like [`either`], but always erases failures into [`BoxError`].
///
/// Use this when the arms fail with unrelated concrete types. Any error which
/// converts into a [`BoxError`] is accepted, registered or not.
pub fn either_erased<A, B, Then, Otherwise>(
    condition: bool,
    then: Then,
    otherwise: Otherwise,
) -> UnifiedAs<A, B, BoxError>
where
    Then: FnOnce() -> A,
    Otherwise: FnOnce() -> B,
    A: TryStream,
    B: TryStream<Ok = A::Ok>,
    A::Error: Into<BoxError>,
    B::Error: Into<BoxError>,
{
    BranchBuilder::<BoxError>::either(condition, then, otherwise)
}

/// Like [`either`], but keeps both concrete failure types in an
/// [`EitherError`].
pub fn either_typed<A, B, Then, Otherwise>(
    condition: bool,
    then: Then,
    otherwise: Otherwise,
) -> UnifiedTyped<A, B>
where
    Then: FnOnce() -> A,
    Otherwise: FnOnce() -> B,
    A: TryStream,
    B: TryStream<Ok = A::Ok>,
{
    tracing::trace!(condition, "selecting typed branch");
    if condition {
        UnifiedStream::left(then().map_err(EitherError::Left as Tag<A, A::Error, B::Error>))
    } else {
        UnifiedStream::right(otherwise().map_err(EitherError::Right as Tag<B, A::Error, B::Error>))
    }
}

/// Unify the arms of a conditional into an explicitly chosen failure type `E`.
///
/// Use this when the failure types can't be reconciled automatically, or
/// when the caller wants a wider failure than the automatic one. Each arm's
/// failure type only has to convert [`Into`] `E`. An arm which can't fail
/// is lifted with
/// [`never_fails_as`](crate::NeverFailsExt::never_fails_as) or
/// [`widen_failure`](crate::UnifiedStreamExt::widen_failure) first, unless
/// [`Infallible`](std::convert::Infallible) already converts into `E`.
///
/// ```
/// use confluence::branch::BranchBuilder;
/// use confluence::BoxError;
/// use futures_util::{stream, StreamExt as _};
///
/// let parse = true;
/// let numbers = if parse {
///     BranchBuilder::<BoxError>::left(stream::iter(["1"]).map(|s| s.parse::<u8>()))
/// } else {
///     BranchBuilder::<BoxError>::right(stream::iter([Ok::<u8, std::fmt::Error>(0)]))
/// };
/// assert!(numbers.is_left());
/// ```
#[derive(Debug)]
pub struct BranchBuilder<E> {
    failure: PhantomData<fn() -> E>,
}

impl<E> BranchBuilder<E> {
    /// Select the first arm of a conditional, widening its failures into `E`.
    pub fn left<A, B>(stream: A) -> UnifiedAs<A, B, E>
    where
        A: TryStream,
        B: TryStream<Ok = A::Ok>,
        A::Error: Into<E>,
        B::Error: Into<E>,
    {
        UnifiedStream::left(stream.err_into())
    }

    /// Select the second arm of a conditional, widening its failures into `E`.
    pub fn right<A, B>(stream: B) -> UnifiedAs<A, B, E>
    where
        A: TryStream,
        B: TryStream<Ok = A::Ok>,
        A::Error: Into<E>,
        B::Error: Into<E>,
    {
        UnifiedStream::right(stream.err_into())
    }

    /// Evaluate one of two arms depending on `condition`, widening failures
    /// into `E`. Only the selected closure is called.
    pub fn either<A, B, Then, Otherwise>(
        condition: bool,
        then: Then,
        otherwise: Otherwise,
    ) -> UnifiedAs<A, B, E>
    where
        Then: FnOnce() -> A,
        Otherwise: FnOnce() -> B,
        A: TryStream,
        B: TryStream<Ok = A::Ok>,
        A::Error: Into<E>,
        B::Error: Into<E>,
    {
        tracing::trace!(
            condition,
            failure = std::any::type_name::<E>(),
            "selecting branch"
        );
        if condition {
            Self::left(then())
        } else {
            Self::right(otherwise())
        }
    }
}

/// Unify the arms of an `if` / `else if` / `else` chain of streams.
///
/// Each arm is written `condition => stream`. Arms are paired right-nested,
/// so `if a => x, else if b => y, else => z` is
/// `either(a, || x, || either(b, || y, || z))`. Only the selected arm's
/// expression is evaluated.
///
/// Without an `else` the missing arm is an empty stream, see [`optional`].
/// A leading `<E>` forces the failure type to `E` instead of reconciling it
/// automatically, see [`BranchBuilder`]. A leading `same` requires every arm
/// to fail with the same type and keeps it, see [`either_same`].
///
/// ```
/// use confluence::{branch, BoxError, NeverFailsExt as _};
/// use futures_util::{stream, StreamExt as _, TryStreamExt as _};
///
/// # async fn run(n: u8) -> Result<Vec<u8>, BoxError> {
/// let items = branch! {
///     if n == 0 => stream::iter([0]).never_fails(),
///     else if n == 1 => stream::iter(["1"]).map(|s| s.parse::<u8>()),
///     else => stream::iter([Ok::<u8, BoxError>(n)]),
/// };
/// items.try_collect().await
/// # }
/// # let _ = run;
/// ```
#[macro_export]
macro_rules! branch {
    (same if $condition:expr => $then:expr $(,)?) => {
        $crate::branch::optional($condition, || $then)
    };

    (same if $condition:expr => $then:expr, else => $otherwise:expr $(,)?) => {
        $crate::branch::either_same($condition, || $then, || $otherwise)
    };

    (same if $condition:expr => $then:expr, else if $($rest:tt)+) => {
        $crate::branch::either_same(
            $condition,
            || $then,
            || $crate::branch!(same if $($rest)+),
        )
    };

    (<$failure:ty> if $condition:expr => $then:expr, else => $otherwise:expr $(,)?) => {
        $crate::branch::BranchBuilder::<$failure>::either($condition, || $then, || $otherwise)
    };

    (<$failure:ty> if $condition:expr => $then:expr, else if $($rest:tt)+) => {
        $crate::branch::BranchBuilder::<$failure>::either(
            $condition,
            || $then,
            || $crate::branch!(<$failure> if $($rest)+),
        )
    };

    (if $condition:expr => $then:expr $(,)?) => {
        $crate::branch::optional($condition, || $then)
    };

    (if $condition:expr => $then:expr, else => $otherwise:expr $(,)?) => {
        $crate::branch::either($condition, || $then, || $otherwise)
    };

    (if $condition:expr => $then:expr, else if $($rest:tt)+) => {
        $crate::branch::either(
            $condition,
            || $then,
            || $crate::branch!(if $($rest)+),
        )
    };
}
