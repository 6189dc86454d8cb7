//! The stream produced by whichever arm of a conditional actually ran.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::stream::FusedStream;
use futures_core::Stream;
use pin_project::pin_project;

#[derive(Debug, Clone)]
#[pin_project(project = ArmProj)]
enum Arm<L, R> {
    Left(#[pin] L),
    Right(#[pin] R),
}

/// Dispatching wrapper over two stream types with the same item type.
///
/// Effectively implements enum-dispatch for [`Stream`] around the two arms of
/// a conditional. The selected arm is fixed when the `UnifiedStream` is
/// created, and all polling, failures and completion are exactly those of
/// that arm. Dropping the `UnifiedStream` drops the arm, which is how a
/// consumer cancels it.
///
/// The arms usually come from [`branch`](crate::branch), which also
/// reconciles their failure types.
#[derive(Debug, Clone)]
#[pin_project]
pub struct UnifiedStream<L, R> {
    #[pin]
    arm: Arm<L, R>,
}

macro_rules! dispatch_arm {
    (pin $unified:ident.$method:ident($($args:expr),*)) => {
        match $unified.project().arm.project() {
            ArmProj::Left(stream) => stream.$method($($args),*),
            ArmProj::Right(stream) => stream.$method($($args),*),
        }
    };

    ($unified:ident.$method:ident($($args:expr),*)) => {
        match &$unified.arm {
            Arm::Left(stream) => stream.$method($($args),*),
            Arm::Right(stream) => stream.$method($($args),*),
        }
    };
}

impl<L, R> UnifiedStream<L, R> {
    /// Select the left arm.
    pub fn left(stream: L) -> Self {
        Self {
            arm: Arm::Left(stream),
        }
    }

    /// Select the right arm.
    pub fn right(stream: R) -> Self {
        Self {
            arm: Arm::Right(stream),
        }
    }

    /// Whether the left arm was selected.
    pub fn is_left(&self) -> bool {
        matches!(self.arm, Arm::Left(_))
    }

    /// Whether the right arm was selected.
    pub fn is_right(&self) -> bool {
        matches!(self.arm, Arm::Right(_))
    }
}

impl<L, R> Stream for UnifiedStream<L, R>
where
    L: Stream,
    R: Stream<Item = L::Item>,
{
    type Item = L::Item;

    #[inline]
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        dispatch_arm!(pin self.poll_next(cx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        dispatch_arm!(self.size_hint())
    }
}

impl<L, R> FusedStream for UnifiedStream<L, R>
where
    L: FusedStream,
    R: FusedStream<Item = L::Item>,
{
    fn is_terminated(&self) -> bool {
        dispatch_arm!(self.is_terminated())
    }
}
