//! Pieces of the `tracert` binary: DNS, display and the run loop glue.

pub mod display;
pub mod resolver;
pub mod runner;
