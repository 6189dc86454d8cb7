//! Compile-time classification of failure types.
//!
//! These markers are never constructed. They only exist so that the widening
//! and reconciliation rules can be written as non-overlapping trait impls.

use std::convert::Infallible;

use super::{BoxError, Failure};
use crate::private::Sealed;

/// A failure kind. Sealed, the only kinds are [`Never`], [`Concrete`] and
/// [`Erased`].
pub trait Kind: Sealed {}

/// The failure type can never be produced, i.e. [`Infallible`].
#[derive(Debug)]
pub enum Never {}

/// A specific, statically known error type.
#[derive(Debug)]
pub enum Concrete {}

/// The type-erased [`BoxError`].
#[derive(Debug)]
pub enum Erased {}

impl Sealed for Never {}
impl Sealed for Concrete {}
impl Sealed for Erased {}

impl Kind for Never {}
impl Kind for Concrete {}
impl Kind for Erased {}

/// Widening of a failure `E` with this kind into the target `T`.
pub trait Widen<E, T>: Kind {
    /// Perform the widening.
    fn widen(error: E) -> T;
}

impl<T> Widen<Infallible, T> for Never {
    #[inline]
    fn widen(error: Infallible) -> T {
        match error {}
    }
}

impl<E, T> Widen<E, T> for Concrete
where
    E: Into<T>,
{
    #[inline]
    fn widen(error: E) -> T {
        error.into()
    }
}

impl Widen<BoxError, BoxError> for Erased {
    #[inline]
    fn widen(error: BoxError) -> BoxError {
        error
    }
}

/// Resolution of the common failure type for a pair of kinds.
pub trait Resolve<A, B> {
    /// The common failure type.
    type Output: Failure;
}

impl Resolve<Infallible, Infallible> for (Never, Never) {
    type Output = Infallible;
}

impl<B: Failure> Resolve<Infallible, B> for (Never, Concrete) {
    type Output = B;
}

impl<A: Failure> Resolve<A, Infallible> for (Concrete, Never) {
    type Output = A;
}

impl<A, B> Resolve<A, B> for (Concrete, Concrete)
where
    A: Failure,
    B: Into<A>,
{
    type Output = A;
}

macro_rules! resolve_erased {
    ($(($left:ty, $right:ty)),+ $(,)?) => {
        $(
            impl<A, B> Resolve<A, B> for ($left, $right) {
                type Output = BoxError;
            }
        )+
    };
}

resolve_erased!(
    (Never, Erased),
    (Concrete, Erased),
    (Erased, Erased),
    (Erased, Never),
    (Erased, Concrete),
);
