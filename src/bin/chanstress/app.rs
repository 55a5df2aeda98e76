//! Stress - harness builder and runner

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::store::SyntheticStore;

use synth_channel::{return_queue, Channel, SelectorRegister, DEFAULT_RETURN_QUEUE_CAPACITY};

/// Counters gathered over one run
#[derive(Debug, Default)]
pub struct Report {
    pub writes: u64,
    pub ticks: u64,
    pub rebinds: u64,
    pub saturations: u64,
    pub reclaimed: u64,
    pub live_instruments: usize,
}

/// Harness builder
pub struct Stress {
    channels: usize,
    writers: usize,
    iterations: usize,
    queue_capacity: usize,
    tick: Duration,
}

impl Stress {
    pub fn new() -> Self {
        Self {
            channels: 16,
            writers: 4,
            iterations: 100_000,
            queue_capacity: DEFAULT_RETURN_QUEUE_CAPACITY,
            tick: Duration::from_micros(250),
        }
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn writers(mut self, writers: usize) -> Self {
        self.writers = writers;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn tick_micros(mut self, micros: u64) -> Self {
        self.tick = Duration::from_micros(micros);
        self
    }

    /// Run to completion and check that nothing leaked.
    pub fn run(self) -> EyreResult<Report> {
        if self.channels == 0 {
            bail!("need at least one channel");
        }

        let store = Arc::new(SyntheticStore::new());
        let channels = Channel::create_all(self.channels, &*store)
            .wrap_err("failed to create channels")?;
        let handles: Arc<Vec<Arc<SelectorRegister>>> =
            Arc::new(channels.iter().map(Channel::selector_handle).collect());

        let (mut queue, reclaimer) = return_queue(self.queue_capacity);
        let reclaimer = reclaimer
            .spawn(Duration::from_millis(1))
            .wrap_err("failed to spawn reclaimer")?;

        log::info!(
            "Starting {} writers x {} writes over {} channels",
            self.writers,
            self.iterations,
            self.channels
        );

        // Render thread: owns the channels and the producer half
        let done = Arc::new(AtomicBool::new(false));
        let render = {
            let store = store.clone();
            let done = done.clone();
            let tick = self.tick;
            let mut channels = channels;
            thread::Builder::new()
                .name("render".into())
                .spawn(move || {
                    let mut report = Report::default();
                    loop {
                        // Read before the pass so the last pass sees every write
                        let finishing = done.load(Ordering::Acquire);
                        let mut rt = queue.render_context();
                        for channel in channels.iter_mut() {
                            if channel.needs_sync() {
                                channel.sync_preset(&*store, &mut rt);
                                report.rebinds += 1;
                            }
                        }
                        report.ticks += 1;
                        if finishing {
                            break;
                        }
                        thread::sleep(tick);
                    }
                    report.saturations = queue.saturations();
                    (channels, report)
                })
                .wrap_err("failed to spawn render thread")?
        };

        // Control threads: each one owns a different selector field
        let writers = (0..self.writers)
            .map(|writer| {
                let handles = handles.clone();
                let iterations = self.iterations;
                thread::Builder::new()
                    .name(format!("control-{writer}"))
                    .spawn(move || {
                        let mut rng = rand::thread_rng();
                        for _ in 0..iterations {
                            let register = &handles[rng.gen_range(0..handles.len())];
                            match writer % 4 {
                                0 => register.set(None, None, Some(rng.gen_range(0..=127))),
                                1 => register.set_bank_lsb(rng.gen_range(0..128)),
                                2 => register.set_bank_msb(rng.gen_range(0..2)),
                                _ => register.set(Some(rng.gen_range(0..4)), None, None),
                            }
                            if rng.gen_bool(0.01) {
                                thread::yield_now();
                            }
                        }
                    })
            })
            .collect::<std::io::Result<Vec<_>>>()
            .wrap_err("failed to spawn control threads")?;

        for writer in writers {
            writer
                .join()
                .map_err(|_| eyre!("control thread panicked"))?;
        }
        done.store(true, Ordering::Release);

        let (channels, mut report) = render
            .join()
            .map_err(|_| eyre!("render thread panicked"))?;
        report.reclaimed = reclaimer
            .join()
            .map_err(|_| eyre!("reclaimer thread panicked"))?;
        report.writes = (self.writers * self.iterations) as u64;

        if let Some(stale) = channels.iter().find(|c| c.needs_sync()) {
            bail!("channel {} still out of sync after final pass", stale.index());
        }

        report.live_instruments = channels.iter().filter(|c| c.instrument().is_some()).count();
        if store.live() != report.live_instruments as i64 {
            bail!(
                "{} instruments alive but {} bound: release leaked or doubled",
                store.live(),
                report.live_instruments
            );
        }

        Ok(report)
    }
}

impl Default for Stress {
    fn default() -> Self {
        Self::new()
    }
}
