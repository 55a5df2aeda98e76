//! Benchmarks for single-channel state primitives.

mod controllers;
mod selector;

pub use controllers::bench_controllers;
pub use selector::bench_selector;
