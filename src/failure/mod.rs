//! Failure types, and the rules for reconciling two of them.
//!
//! A stream in this crate is any [`TryStream`](futures_core::TryStream). The
//! error type of that stream is its *failure type*. When two arms of a
//! conditional produce streams with different failure types, one common
//! failure type has to be chosen and each arm widened into it.
//!
//! Widening is only ever allowed to make a failure type more general:
//!
//! - [`Infallible`] widens into anything, since it can never be produced.
//! - A concrete error widens into any type it converts [`Into`], which covers
//!   both the identity conversion and erasure into [`BoxError`].
//! - [`BoxError`] only widens into itself.
//!
//! Rust has no specialization, so the compiler can't tell whether an
//! arbitrary type is [`Infallible`], [`BoxError`], or something else. Each
//! failure type instead names its [`Kind`](kind::Kind) by implementing
//! [`Failure`], and the reconciliation rules are written against the kinds.
//! Concrete error types opt in with [`concrete_failure!`](crate::concrete_failure).
//!
//! The orphan rule only lets a crate register its own types. Errors from
//! other crates, and std errors which aren't registered here, still work
//! wherever the target failure type is named explicitly, since those paths
//! only need [`Into`].

use std::convert::Infallible;

mod either;
pub mod kind;

pub use self::either::EitherError;
use self::kind::{Concrete, Erased, Kind, Never, Resolve, Widen};

/// A type-erased failure which can hold any error value.
///
/// The original error is recoverable with [`Box::downcast`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A type which can be used as the failure type of a stream.
pub trait Failure: Sized {
    /// How this failure type takes part in reconciliation.
    type Kind: Kind;
}

impl Failure for Infallible {
    type Kind = Never;
}

impl Failure for BoxError {
    type Kind = Erased;
}

impl<L, R> Failure for EitherError<L, R> {
    type Kind = Concrete;
}

/// Register concrete error types so that they take part in automatic
/// failure reconciliation.
///
/// ```
/// #[derive(Debug)]
/// struct QuotaExceeded;
///
/// impl std::fmt::Display for QuotaExceeded {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("quota exceeded")
///     }
/// }
///
/// impl std::error::Error for QuotaExceeded {}
///
/// confluence::concrete_failure!(QuotaExceeded);
/// ```
///
/// Generic error types should implement [`Failure`] by hand, with
/// `type Kind = confluence::failure::kind::Concrete`.
#[macro_export]
macro_rules! concrete_failure {
    ($($failure:ty),+ $(,)?) => {
        $(
            impl $crate::failure::Failure for $failure {
                type Kind = $crate::failure::kind::Concrete;
            }
        )+
    };
}

concrete_failure!(
    std::io::Error,
    std::fmt::Error,
    std::num::ParseIntError,
    std::num::ParseFloatError,
    std::num::TryFromIntError,
    std::str::ParseBoolError,
    std::str::Utf8Error,
    std::string::FromUtf8Error,
    std::char::ParseCharError,
    std::sync::mpsc::RecvError,
);

/// Widen a failure value into the target failure type `T`.
///
/// Implemented for every [`Failure`] whose kind permits the widening, see the
/// [module documentation](self) for the rules.
pub trait WidenInto<T>: Failure {
    /// Convert this failure into the wider failure type.
    fn widen(self) -> T;
}

impl<E, T> WidenInto<T> for E
where
    E: Failure,
    E::Kind: Widen<E, T>,
{
    #[inline]
    fn widen(self) -> T {
        <E::Kind as Widen<E, T>>::widen(self)
    }
}

/// Pick the common failure type for two streams which fail with `Self`
/// and `Other`.
///
/// | `Self`       | `Other`      | `Output`       |
/// |--------------|--------------|----------------|
/// | never        | never        | [`Infallible`] |
/// | never        | concrete `B` | `B`            |
/// | concrete `A` | never        | `A`            |
/// | any          | erased       | [`BoxError`]   |
/// | erased       | any          | [`BoxError`]   |
/// | concrete `A` | concrete `B` | `A`, when `B: Into<A>` |
///
/// When `A` and `B` each convert into the other, the left side wins, so the
/// order of the arms decides the result.
///
/// Two unrelated concrete failure types have no automatic resolution, and
/// using them together is a compile error. Name the target explicitly with
/// [`BranchBuilder`](crate::branch::BranchBuilder), or use
/// [`either_erased`](crate::branch::either_erased) /
/// [`either_typed`](crate::branch::either_typed).
pub trait Reconcile<Other>: Failure {
    /// The failure type both sides widen into.
    type Output: Failure;
}

impl<A, B> Reconcile<B> for A
where
    A: Failure,
    B: Failure,
    (A::Kind, B::Kind): Resolve<A, B>,
{
    type Output = <(A::Kind, B::Kind) as Resolve<A, B>>::Output;
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("first")]
    struct First;

    #[derive(Debug, thiserror::Error)]
    #[error("second")]
    struct Second;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("wide: {0}")]
    struct Wide(&'static str);

    #[derive(Debug, thiserror::Error)]
    #[error("narrow")]
    struct Narrow;

    impl From<Narrow> for Wide {
        fn from(_: Narrow) -> Self {
            Wide("narrow")
        }
    }

    concrete_failure!(First, Second, Wide, Narrow);

    fn resolved<A: Reconcile<B>, B>() -> TypeId
    where
        A::Output: 'static,
    {
        TypeId::of::<A::Output>()
    }

    assert_impl_all!(Infallible: WidenInto<Infallible>, WidenInto<First>, WidenInto<BoxError>);
    assert_impl_all!(First: WidenInto<First>, WidenInto<BoxError>);
    assert_impl_all!(BoxError: WidenInto<BoxError>);
    assert_not_impl_any!(BoxError: WidenInto<First>, WidenInto<Infallible>);
    assert_not_impl_any!(First: WidenInto<Second>, WidenInto<Infallible>);

    assert_impl_all!(Wide: Reconcile<Narrow>, Reconcile<Wide>);
    assert_not_impl_any!(Narrow: Reconcile<Wide>);
    assert_not_impl_any!(First: Reconcile<Second>);
    assert_not_impl_any!(Second: Reconcile<First>);
    assert_not_impl_any!(std::env::VarError: Reconcile<std::env::VarError>, WidenInto<BoxError>);

    #[test]
    fn reconcile_never_with_never() {
        assert_eq!(
            resolved::<Infallible, Infallible>(),
            TypeId::of::<Infallible>()
        );
    }

    #[test]
    fn reconcile_never_with_concrete() {
        assert_eq!(resolved::<Infallible, First>(), TypeId::of::<First>());
        assert_eq!(resolved::<First, Infallible>(), TypeId::of::<First>());
    }

    #[test]
    fn reconcile_identical_concrete() {
        assert_eq!(resolved::<First, First>(), TypeId::of::<First>());
        assert_eq!(
            resolved::<std::io::Error, std::io::Error>(),
            TypeId::of::<std::io::Error>()
        );
    }

    #[test]
    fn reconcile_declared_conversion() {
        assert_eq!(resolved::<Wide, Narrow>(), TypeId::of::<Wide>());
        assert_eq!(resolved::<Wide, Infallible>(), TypeId::of::<Wide>());

        let widened: Wide = Narrow.widen();
        assert_eq!(widened, Wide("narrow"));
    }

    #[test]
    fn reconcile_anything_with_erased() {
        assert_eq!(resolved::<First, BoxError>(), TypeId::of::<BoxError>());
        assert_eq!(resolved::<BoxError, Second>(), TypeId::of::<BoxError>());
        assert_eq!(resolved::<Infallible, BoxError>(), TypeId::of::<BoxError>());
        assert_eq!(resolved::<BoxError, Infallible>(), TypeId::of::<BoxError>());
        assert_eq!(resolved::<BoxError, BoxError>(), TypeId::of::<BoxError>());
    }

    #[test]
    fn erased_failure_round_trips() {
        let erased: BoxError = First.widen();
        assert!(erased.downcast::<First>().is_ok());
    }
}
