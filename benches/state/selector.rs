//! Benchmarks for the packed selector register.

use std::hint::black_box;

use criterion::Criterion;
use synth_channel::{Selector, SelectorRegister};

pub fn bench_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/selector");
    let register = SelectorRegister::new(Selector::new(1, 128, 10));

    group.bench_function("get", |b| {
        b.iter(|| black_box(register.get()));
    });

    // Uncontended CAS, whole triple
    let mut program = 0u8;
    group.bench_function("set_all", |b| {
        b.iter(|| {
            program = (program + 1) & 0x7F;
            register.set(Some(1), Some(black_box(128)), Some(black_box(program)));
        })
    });

    // Sub-field update used by bank select
    let mut lsb = 0u8;
    group.bench_function("set_bank_lsb", |b| {
        b.iter(|| {
            lsb = (lsb + 1) & 0x7F;
            register.set_bank_lsb(black_box(lsb));
        })
    });

    // Early exit when the value is already there
    group.bench_function("set_unchanged", |b| {
        b.iter(|| register.set(None, None, Some(black_box(program))));
    });

    group.finish();
}
