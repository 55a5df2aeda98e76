pub mod channel; // Per-channel performance state
pub mod error;
pub mod io;
pub mod preset; // Instrument bindings and tuning tables
pub mod reclaim; // Render-thread teardown handoff

pub use channel::{Channel, InterpolationMethod, ResetMode, Selector, SelectorRegister};
pub use error::ChannelError;
pub use preset::{Instrument, PresetEvent, PresetStore, TuningTable};
pub use reclaim::{Reclaim, ReclaimSink, RenderContext, Retire};
#[cfg(feature = "rtrb")]
pub use reclaim::{return_queue, Reclaimer, ReturnQueue};

/// Upper bound on channels per synthesizer.
pub const MAX_CHANNELS: usize = 256;
/// Channel (0-based) that defaults to the percussion bank.
pub const PERCUSSION_CHANNEL: usize = 9;
pub(crate) const PERCUSSION_BANK: u16 = 128;
/// Return queue size used by hosts that don't pick their own.
pub const DEFAULT_RETURN_QUEUE_CAPACITY: usize = 1024;
