//! Benchmarks for the controller reset state machine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synth_channel::channel::{ControllerBank, ResetMode};

pub fn bench_controllers(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/controllers");
    let mut bank = ControllerBank::new();

    for (name, mode) in [
        ("full", ResetMode::Full),
        ("all_controllers_off", ResetMode::AllControllersOff),
    ] {
        group.bench_with_input(BenchmarkId::new("reset", name), &mode, |b, &mode| {
            b.iter(|| {
                bank.reset(black_box(mode));
            })
        });
    }

    group.finish();
}
