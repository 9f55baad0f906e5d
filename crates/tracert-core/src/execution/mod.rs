//! Execution of a trace.
//!
//! Probes are sent one at a time; there is no parallel mode because per-probe
//! display and the stop conditions depend on the order of outcomes.

pub mod serial;

pub use serial::trace_route;
