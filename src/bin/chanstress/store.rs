//! Synthetic preset store: every selection resolves to a small patch object
//! except program 127, which is left empty to exercise the silent path.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use synth_channel::{Instrument, PresetEvent, PresetStore};

pub struct SyntheticStore {
    live: Arc<AtomicI64>,
}

impl SyntheticStore {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Patches currently alive (resolved and not yet dropped).
    pub fn live(&self) -> i64 {
        self.live.load(Ordering::SeqCst)
    }
}

impl PresetStore for SyntheticStore {
    fn resolve(&self, source: u16, bank: u16, program: u8) -> Option<Box<dyn Instrument>> {
        if program == 127 {
            return None;
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(Patch {
            name: format!("{source}:{bank}:{program}"),
            // A little heap so dropping it actually frees something
            _samples: vec![0.0; 256],
            live: self.live.clone(),
        }))
    }
}

struct Patch {
    name: String,
    _samples: Vec<f32>,
    live: Arc<AtomicI64>,
}

impl Instrument for Patch {
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&mut self, event: PresetEvent, channel: usize) {
        log::trace!("Patch {} {:?} on channel {}", self.name, event, channel);
    }
}

impl Drop for Patch {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
