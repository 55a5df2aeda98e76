// Purpose: the instrument side of a channel - what gets bound, and who
// resolves bank/program numbers into something playable

pub mod tuning;

pub use tuning::TuningTable;

/// Selection change reported to a bound instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PresetEvent {
    Selected,
    Deselected,
}

/// An instrument definition bound to a channel.
///
/// A channel owns its instrument outright. Dropping it may block or free
/// memory, so the render thread never drops one directly: it is handed to
/// the reclaimer instead.
pub trait Instrument: Send {
    /// Human readable name, for diagnostics.
    fn name(&self) -> &str;

    /// Fire-and-forget selection notice.
    ///
    /// Default implementation does nothing.
    fn notify(&mut self, _event: PresetEvent, _channel: usize) {
        // Default: do nothing
    }
}

/// Resolves {source, bank, program} to a fresh instrument binding.
///
/// `None` is a legitimate answer: the channel plays silence until a valid
/// selection is made.
pub trait PresetStore: Send + Sync {
    fn resolve(&self, source: u16, bank: u16, program: u8) -> Option<Box<dyn Instrument>>;
}

/// Allow plain closures as preset stores (handy for tests and tools)
impl<F> PresetStore for F
where
    F: Fn(u16, u16, u8) -> Option<Box<dyn Instrument>> + Send + Sync,
{
    fn resolve(&self, source: u16, bank: u16, program: u8) -> Option<Box<dyn Instrument>> {
        self(source, bank, program)
    }
}
