//! Core types, traits, and the hop tracer for tracert.
//!
//! This crate provides the fundamental abstractions used throughout the
//! workspace:
//!
//! - [`ProbeSender`] trait for the echo-probe primitive
//! - [`NameResolver`] and [`TraceObserver`] traits for the collaborators
//! - [`execution::trace_route`], the TTL-incrementing probe loop
//! - [`TraceSession`] and the other result types

pub mod error;
pub mod execution;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ResolveError, TraceError};
pub use execution::trace_route;
pub use result::{HopRecord, TraceSession, TraceStatus, TraceTarget};
pub use traits::{NameResolver, NoopObserver, ProbeSender, TraceObserver};
pub use types::{
    CancelFlag, ProbeOutcome, TraceParams, CANCELLED_MESSAGE, DEFAULT_MAX_HOPS,
    DEFAULT_TIMEOUT_MS, NUMBER_OF_PACKETS,
};
