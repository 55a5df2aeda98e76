// Purpose: per-channel performance state
// Control threads write the selector and controllers, the render thread
// rebinds the instrument

pub mod controllers;
pub mod generators;
pub mod selector;

use std::sync::Arc;

pub use controllers::{cc, ControllerBank, ResetMode};
pub use generators::{GenOverride, GeneratorOverrides, GEN_COUNT};
pub use selector::{Selector, SelectorRegister};

use crate::{
    error::ChannelError,
    io::midi::MidiEvent,
    preset::{Instrument, PresetEvent, PresetStore, TuningTable},
    reclaim::{RenderContext, Retire},
    MAX_CHANNELS, PERCUSSION_BANK, PERCUSSION_CHANNEL,
};

/// Sample interpolation quality used by voices on this channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationMethod {
    None,
    Linear,
    #[default]
    FourthOrder,
    SeventhOrder,
}

/// RPN 0,0: pitch bend range
const RPN_PITCH_BEND_RANGE: u8 = 0;
/// NRPN MSB announcing a SoundFont 2.01 generator address
const NRPN_SF2_MSB: u8 = 120;
/// NRPN data entry centre (14-bit)
const NRPN_DATA_CENTER: i32 = 8192;

/// Selector a freshly (re)initialized channel points at.
fn default_selector(index: usize) -> Selector {
    let bank = if index == PERCUSSION_CHANNEL {
        PERCUSSION_BANK
    } else {
        0
    };
    Selector::new(0, bank, 0)
}

/// One MIDI channel of the synthesizer.
///
/// The selector is shared with control threads through
/// [`selector_handle`](Self::selector_handle). Everything else is owned by
/// whoever holds the channel; instrument and tuning swaps additionally need
/// a [`RenderContext`].
pub struct Channel {
    index: usize,
    selector: Arc<SelectorRegister>,
    /// Selector value the bound instrument was resolved from
    bound: Selector,
    controllers: ControllerBank,
    generators: GeneratorOverrides,
    instrument: Option<Box<dyn Instrument>>,
    tuning: Option<Arc<TuningTable>>,
    tuning_bank: u8,
    tuning_program: u8,
    interpolation: InterpolationMethod,
}

impl Channel {
    /// Create and initialize channel `index`.
    ///
    /// Channel 9 starts on the percussion bank (128), every other channel on
    /// bank 0. Program is 0 in both cases.
    pub fn new(index: usize, store: &dyn PresetStore) -> Result<Self, ChannelError> {
        if index >= MAX_CHANNELS {
            return Err(ChannelError::IndexOutOfRange {
                index,
                max: MAX_CHANNELS - 1,
            });
        }

        let selector = default_selector(index);
        let mut instrument = store.resolve(selector.source, selector.bank, selector.program);
        if let Some(instrument) = instrument.as_mut() {
            instrument.notify(PresetEvent::Selected, index);
        }

        let mut channel = Self {
            index,
            selector: Arc::new(SelectorRegister::new(selector)),
            bound: selector,
            controllers: ControllerBank::new(),
            generators: GeneratorOverrides::new(),
            instrument,
            tuning: None,
            tuning_bank: 0,
            tuning_program: 0,
            interpolation: InterpolationMethod::default(),
        };
        channel.reset_controllers(ResetMode::Full);

        log::debug!(
            "Channel {} created on bank {} program {}",
            index,
            selector.bank,
            selector.program
        );
        Ok(channel)
    }

    /// Create channels `0..count`.
    pub fn create_all(count: usize, store: &dyn PresetStore) -> Result<Vec<Channel>, ChannelError> {
        let mut channels = Vec::new();
        channels
            .try_reserve_exact(count)
            .map_err(|_| ChannelError::OutOfMemory { count })?;
        for index in 0..count {
            channels.push(Channel::new(index, store)?);
        }
        Ok(channels)
    }

    /// Full re-initialization: default selector, instrument re-resolved,
    /// tuning dropped, every controller back to defaults.
    pub fn reset(&mut self, store: &dyn PresetStore, rt: &mut RenderContext<'_>) -> Retire {
        self.selector.store(default_selector(self.index));
        let rebound = self.sync_preset(store, rt);

        self.interpolation = InterpolationMethod::default();
        self.tuning_bank = 0;
        self.tuning_program = 0;
        self.controllers.reset_nrpn();
        let untuned = self.set_tuning(None, rt);

        self.reset_controllers(ResetMode::Full);

        rebound.merge(untuned)
    }

    /// Run the controller reset state machine and clear generator
    /// overrides.
    pub fn reset_controllers(&mut self, mode: ResetMode) {
        self.controllers.reset(mode);
        self.generators.clear();
    }

    // =========================================================================
    // Render context
    // =========================================================================

    /// Swap the bound instrument.
    ///
    /// The old instrument is told it was deselected and handed to the
    /// reclaimer; the new one is stored and told it was selected. Returns
    /// [`Retire::Inline`] if the return queue was full and the old
    /// instrument was dropped here. The swap completes either way.
    pub fn rebind(
        &mut self,
        instrument: Option<Box<dyn Instrument>>,
        rt: &mut RenderContext<'_>,
    ) -> Retire {
        let outcome = match self.instrument.take() {
            Some(mut old) => {
                old.notify(PresetEvent::Deselected, self.index);
                rt.retire_instrument(old)
            }
            None => Retire::Nothing,
        };

        self.instrument = instrument;
        if let Some(new) = self.instrument.as_mut() {
            new.notify(PresetEvent::Selected, self.index);
        }

        outcome
    }

    /// Resolve the current selector against `store` and rebind.
    pub fn sync_preset(&mut self, store: &dyn PresetStore, rt: &mut RenderContext<'_>) -> Retire {
        let selector = self.selector.get();
        let instrument = store.resolve(selector.source, selector.bank, selector.program);
        if instrument.is_none() {
            log::debug!(
                "Channel {}: no instrument for source {} bank {} program {}",
                self.index,
                selector.source,
                selector.bank,
                selector.program
            );
        }
        self.bound = selector;
        self.rebind(instrument, rt)
    }

    /// True if the selector moved since the instrument was last resolved.
    pub fn needs_sync(&self) -> bool {
        self.selector.get() != self.bound
    }

    /// Replace the tuning table. The previous handle is released through the
    /// reclaimer.
    pub fn set_tuning(
        &mut self,
        tuning: Option<Arc<TuningTable>>,
        rt: &mut RenderContext<'_>,
    ) -> Retire {
        let outcome = match self.tuning.take() {
            Some(old) => rt.retire_tuning(old),
            None => Retire::Nothing,
        };
        self.tuning = tuning;
        outcome
    }

    // =========================================================================
    // Control path
    // =========================================================================

    /// Apply a channel-state MIDI message. Returns `false` if the message is
    /// addressed to another channel.
    ///
    /// Bank select and program change only move the selector; the render
    /// thread picks the change up through [`sync_preset`](Self::sync_preset).
    pub fn handle_event(&mut self, event: MidiEvent) -> bool {
        if event.channel() as usize != self.index {
            return false;
        }

        match event {
            MidiEvent::ControlChange {
                controller, value, ..
            } => self.control_change(controller, value),
            MidiEvent::ProgramChange { program, .. } => {
                self.selector.set(None, None, Some(program));
            }
            MidiEvent::PitchBend { value, .. } => self.controllers.set_pitch_bend(value),
            MidiEvent::ChannelPressure { value, .. } => {
                self.controllers.set_channel_pressure(value)
            }
            MidiEvent::KeyPressure { value, .. } => self.controllers.set_key_pressure(value),
        }
        true
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        let value = value & 0x7F;
        self.controllers.set_cc(controller, value);

        match controller {
            cc::BANK_SELECT_MSB => self.selector.set_bank_msb(value),
            cc::BANK_SELECT_LSB => self.selector.set_bank_lsb(value),
            cc::ALL_CTRL_OFF => self.reset_controllers(ResetMode::AllControllersOff),
            cc::NRPN_MSB => {
                self.controllers.set_cc(cc::NRPN_LSB, 0);
                self.controllers.set_nrpn_select(0);
                self.controllers.set_nrpn_active(true);
            }
            cc::NRPN_LSB => {
                // SoundFont 2.01 NRPN: 100/101/102 scale the next digits
                if self.controllers.cc(cc::NRPN_MSB) == NRPN_SF2_MSB {
                    let select = self.controllers.nrpn_select();
                    let step = match value {
                        100 => 100,
                        101 => 1000,
                        102 => 10000,
                        v if v < 100 => v as u16,
                        _ => 0,
                    };
                    self.controllers.set_nrpn_select(select.saturating_add(step));
                }
                self.controllers.set_nrpn_active(true);
            }
            cc::RPN_MSB | cc::RPN_LSB => self.controllers.set_nrpn_active(false),
            cc::DATA_ENTRY_MSB => self.data_entry(value),
            _ => {}
        }
    }

    fn data_entry(&mut self, msb: u8) {
        let data = self.controllers.cc14(cc::DATA_ENTRY_MSB, cc::DATA_ENTRY_LSB);

        if self.controllers.nrpn_active() {
            if self.controllers.cc(cc::NRPN_MSB) == NRPN_SF2_MSB
                && self.controllers.cc(cc::NRPN_LSB) < 100
            {
                // Offset from centre in NRPN steps; per-generator scaling
                // happens in the voice pipeline.
                let generator = self.controllers.nrpn_select() as usize;
                let offset = (data as i32 - NRPN_DATA_CENTER) as f32;
                if !self.generators.set(generator, offset, false) {
                    log::debug!("Channel {}: NRPN for unknown generator {}", self.index, generator);
                }
            }
            self.controllers.set_nrpn_select(0);
        } else if self.controllers.cc(cc::RPN_MSB) == 0
            && self.controllers.cc(cc::RPN_LSB) == RPN_PITCH_BEND_RANGE
        {
            self.controllers.set_pitch_wheel_sensitivity(msb);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_percussion(&self) -> bool {
        self.index == PERCUSSION_CHANNEL
    }

    /// Shared handle for control threads.
    pub fn selector_handle(&self) -> Arc<SelectorRegister> {
        Arc::clone(&self.selector)
    }

    pub fn selector(&self) -> Selector {
        self.selector.get()
    }

    pub fn instrument(&self) -> Option<&dyn Instrument> {
        self.instrument.as_deref()
    }

    pub fn tuning(&self) -> Option<&Arc<TuningTable>> {
        self.tuning.as_ref()
    }

    pub fn tuning_selection(&self) -> (u8, u8) {
        (self.tuning_bank, self.tuning_program)
    }

    pub fn set_tuning_selection(&mut self, bank: u8, program: u8) {
        self.tuning_bank = bank;
        self.tuning_program = program;
    }

    pub fn controllers(&self) -> &ControllerBank {
        &self.controllers
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerBank {
        &mut self.controllers
    }

    pub fn generators(&self) -> &GeneratorOverrides {
        &self.generators
    }

    pub fn generators_mut(&mut self) -> &mut GeneratorOverrides {
        &mut self.generators
    }

    pub fn interpolation(&self) -> InterpolationMethod {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, method: InterpolationMethod) {
        self.interpolation = method;
    }
}

/// Teardown runs off the render thread, so the instrument is dropped in place.
impl Drop for Channel {
    fn drop(&mut self) {
        if let Some(instrument) = self.instrument.take() {
            log::trace!("Channel {} releasing {}", self.index, instrument.name());
        }
    }
}

impl core::fmt::Debug for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Channel")
            .field("index", &self.index)
            .field("selector", &self.selector.get())
            .field("instrument", &self.instrument.as_ref().map(|i| i.name()))
            .field("tuning", &self.tuning.as_ref().map(|t| t.name()))
            .field("interpolation", &self.interpolation)
            .finish()
    }
}
