// --- File: crates/calrelay_common/src/services.rs ---
//! Shared plumbing for the service traits defined by the feature crates.
//!
//! The calendar provider and the payment facilitator are both reached through
//! object-safe traits returning [`BoxFuture`], so handlers can hold them as
//! `Arc<dyn ...>` and tests can swap in fakes.

use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;
