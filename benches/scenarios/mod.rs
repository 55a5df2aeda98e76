//! Real-world scenario benchmarks.
//!
//! These model what a render loop actually does each tick: check every
//! channel's selector and rebind the ones that moved.

mod render_tick;

pub use render_tick::bench_render_tick;
