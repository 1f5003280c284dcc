//! Crate-internal test suites.

pub mod helpers;

mod cycles;
mod traversal;
