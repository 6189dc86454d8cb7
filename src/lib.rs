//! Confluence
//!
//! Typed branch unification for async stream pipelines.
//!
//! The arms of an `if` inside a stream callback usually produce different
//! concrete stream types, and often different failure types too. Rather than
//! boxing every arm, confluence wraps the arms in a [`UnifiedStream`] and
//! widens their failures to a common type:
//!
//! - the same failure type on both sides is kept as is,
//! - a stream which can't fail ([`Infallible`](std::convert::Infallible))
//!   takes on the other side's failure type,
//! - a [`BoxError`] on either side makes the result a [`BoxError`].
//!
//! ```
//! use confluence::{branch, BoxError, NeverFailsExt as _, UnifiedStreamExt as _};
//! use futures_util::{stream, StreamExt as _, TryStreamExt as _};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("no entry for {0}")]
//! struct Missing(u8);
//!
//! confluence::concrete_failure!(Missing);
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let words: Result<Vec<&str>, BoxError> = stream::iter([0u8, 1, 2])
//!     .never_fails()
//!     .flat_map_unified(|key| {
//!         branch!(
//!             if key == 0 => stream::iter(["a"]).never_fails(),
//!             else => stream::iter([Ok("b"), Err(Missing(key))]),
//!         )
//!         .erase_failure()
//!     })
//!     .try_collect()
//!     .await;
//!
//! let failure = words.unwrap_err();
//! assert_eq!(failure.to_string(), "no entry for 1");
//! # }
//! ```
//!
//! # Registering failure types
//!
//! Automatic reconciliation works on failure types which implement
//! [`Failure`]: [`Infallible`](std::convert::Infallible), [`BoxError`],
//! [`EitherError`], a handful of std errors, and any type of your own
//! registered with [`concrete_failure!`]. The orphan rule stops you from
//! registering a type from another crate. Arms failing with such a type
//! still unify through the entry points which don't reconcile:
//!
//! - [`branch::either_same`] or `branch!(same if ...)` when the arms share
//!   one failure type,
//! - [`branch::BranchBuilder`], [`branch::either_erased`] or `branch!(<E> ...)`
//!   to name the target type, which only needs [`Into`],
//! - [`UnifiedStreamExt::flat_map_unified_to`] and
//!   [`UnifiedStreamExt::erase_failure`] for flattening and erasure.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod branch;
pub mod coerce;
pub mod failure;
mod flat_map;
pub mod subscribe;
mod unified;

pub use self::coerce::{NeverFails, NeverFailsExt, WidenFailure};
pub use self::failure::{BoxError, EitherError, Failure, Reconcile, WidenInto};
pub use self::flat_map::{FlatMapUnified, UnifiedStreamExt};
pub use self::subscribe::{Completion, SubscribeExt, Subscriber, Subscription};
pub use self::unified::UnifiedStream;

pub(crate) mod private {

    pub trait Sealed {}
}
