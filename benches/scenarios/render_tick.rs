//! Benchmarks for a render tick over a full channel set.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synth_channel::{return_queue, Channel, Instrument, PresetStore};

use crate::CHANNEL_COUNTS;

struct Stub;

impl Instrument for Stub {
    fn name(&self) -> &str {
        "stub"
    }
}

struct StubStore;

impl PresetStore for StubStore {
    fn resolve(&self, _source: u16, _bank: u16, _program: u8) -> Option<Box<dyn Instrument>> {
        Some(Box::new(Stub))
    }
}

pub fn bench_render_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render_tick");
    let store = StubStore;

    for &count in CHANNEL_COUNTS {
        let mut channels = Channel::create_all(count, &store).expect("create channels");
        let (mut queue, mut reclaimer) = return_queue(count * 2);

        // Nothing changed: the common case, a selector load per channel
        group.bench_with_input(BenchmarkId::new("idle", count), &count, |b, _| {
            b.iter(|| {
                let mut rt = queue.render_context();
                for channel in channels.iter_mut() {
                    if black_box(channel.needs_sync()) {
                        channel.sync_preset(&store, &mut rt);
                    }
                }
            })
        });

        // Every channel got a program change since the last tick
        let handles: Vec<_> = channels.iter().map(Channel::selector_handle).collect();
        let mut program = 0u8;
        group.bench_with_input(BenchmarkId::new("all_rebind", count), &count, |b, _| {
            b.iter(|| {
                program = (program + 1) & 0x7F;
                for handle in &handles {
                    handle.set(None, None, Some(program));
                }
                let mut rt = queue.render_context();
                for channel in channels.iter_mut() {
                    if channel.needs_sync() {
                        channel.sync_preset(&store, &mut rt);
                    }
                }
                reclaimer.drain();
            })
        });
    }

    group.finish();
}
