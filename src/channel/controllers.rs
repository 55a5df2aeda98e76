/*
Controller Bank
===============

Per-channel MIDI controller state: 128 seven-bit controller values plus the
scalar performance state that does not live in the CC array (pressures,
pitch bend, pitch-wheel sensitivity, NRPN selection).

Two Kinds of Reset
------------------

  Full                Channel (re)initialisation. Everything goes to zero,
                      then the General MIDI defaults are layered on top.

  AllControllersOff   CC 121 "Reset All Controllers", following MIDI RP-15.
                      A soft reset: the performer's mix (volume, pan, bank,
                      effect sends, sound controllers) survives.

Both modes run in two passes. The zero pass clears controllers (all of
them, or everything below ALL_SOUND_OFF minus the exclusion list), then the
default pass writes the null RPN/NRPN selection and full expression. The
null selection and expression are written in both modes so they always win
over the zero pass.

  index          Full        AllControllersOff
  ─────────────  ──────────  ─────────────────
  0, 32 bank     0           kept
  7, 39 volume   100 / 0     kept
  10, 42 pan     64 / 0      kept
  11, 43 expr    127 / 127   127 / 127
  70..=79 sound  64          kept
  91..=95 fx     0           kept
  98..=101 (N)RPN 127        127
  120..=127      0           kept
  everything     0           0
  else
*/

/// Number of MIDI continuous controllers.
pub const CC_COUNT: usize = 128;

/// Pitch bend centre value (14-bit range 0x0000..=0x3FFF).
pub const PITCH_BEND_CENTER: u16 = 0x2000;

/// Default pitch-wheel sensitivity in semitones.
pub const DEFAULT_PITCH_WHEEL_SENSITIVITY: u8 = 2;

/// MIDI controller numbers used by the channel.
pub mod cc {
    pub const BANK_SELECT_MSB: u8 = 0;
    pub const MODULATION_MSB: u8 = 1;
    pub const BREATH_MSB: u8 = 2;
    pub const FOOT_MSB: u8 = 4;
    pub const PORTAMENTO_TIME_MSB: u8 = 5;
    pub const DATA_ENTRY_MSB: u8 = 6;
    pub const VOLUME_MSB: u8 = 7;
    pub const BALANCE_MSB: u8 = 8;
    pub const PAN_MSB: u8 = 10;
    pub const EXPRESSION_MSB: u8 = 11;
    pub const BANK_SELECT_LSB: u8 = 32;
    pub const MODULATION_LSB: u8 = 33;
    pub const DATA_ENTRY_LSB: u8 = 38;
    pub const VOLUME_LSB: u8 = 39;
    pub const PAN_LSB: u8 = 42;
    pub const EXPRESSION_LSB: u8 = 43;
    pub const SUSTAIN_SWITCH: u8 = 64;
    pub const PORTAMENTO_SWITCH: u8 = 65;
    pub const SOSTENUTO_SWITCH: u8 = 66;
    pub const SOFT_PEDAL_SWITCH: u8 = 67;
    pub const SOUND_CTRL1: u8 = 70;
    pub const SOUND_CTRL10: u8 = 79;
    pub const EFFECTS_DEPTH1: u8 = 91;
    pub const EFFECTS_DEPTH5: u8 = 95;
    pub const DATA_ENTRY_INCR: u8 = 96;
    pub const DATA_ENTRY_DECR: u8 = 97;
    pub const NRPN_LSB: u8 = 98;
    pub const NRPN_MSB: u8 = 99;
    pub const RPN_LSB: u8 = 100;
    pub const RPN_MSB: u8 = 101;
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const ALL_CTRL_OFF: u8 = 121;
    pub const LOCAL_CONTROL: u8 = 122;
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// Which reset flavour to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResetMode {
    /// Zero everything, then apply General MIDI defaults.
    Full,
    /// MIDI RP-15 "Reset All Controllers".
    AllControllersOff,
}

/// Controllers left untouched by [`ResetMode::AllControllersOff`].
#[inline]
fn survives_soft_reset(index: u8) -> bool {
    matches!(
        index,
        cc::EFFECTS_DEPTH1..=cc::EFFECTS_DEPTH5
            | cc::SOUND_CTRL1..=cc::SOUND_CTRL10
            | cc::BANK_SELECT_MSB
            | cc::BANK_SELECT_LSB
            | cc::VOLUME_MSB
            | cc::VOLUME_LSB
            | cc::PAN_MSB
            | cc::PAN_LSB
    )
}

pub struct ControllerBank {
    values: [u8; CC_COUNT],
    key_pressure: u8,
    channel_pressure: u8,
    pitch_bend: u16,
    pitch_wheel_sensitivity: u8,
    nrpn_select: u16,
    nrpn_active: bool,
    initialized: bool,
}

impl ControllerBank {
    /// An uninitialized bank. Call [`reset`](Self::reset) before use.
    pub fn new() -> Self {
        Self {
            values: [0; CC_COUNT],
            key_pressure: 0,
            channel_pressure: 0,
            pitch_bend: PITCH_BEND_CENTER,
            pitch_wheel_sensitivity: 0,
            nrpn_select: 0,
            nrpn_active: false,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the reset state machine. Always leaves the bank initialized.
    pub fn reset(&mut self, mode: ResetMode) {
        self.key_pressure = 0;
        self.channel_pressure = 0;
        self.pitch_bend = PITCH_BEND_CENTER;

        // Zero pass
        match mode {
            ResetMode::Full => self.values.fill(0),
            ResetMode::AllControllersOff => {
                for index in 0..cc::ALL_SOUND_OFF {
                    if !survives_soft_reset(index) {
                        self.values[index as usize] = 0;
                    }
                }
            }
        }

        // Defaults applied in every mode
        self.values[cc::RPN_LSB as usize] = 127;
        self.values[cc::RPN_MSB as usize] = 127;
        self.values[cc::NRPN_LSB as usize] = 127;
        self.values[cc::NRPN_MSB as usize] = 127;
        self.values[cc::EXPRESSION_MSB as usize] = 127;
        self.values[cc::EXPRESSION_LSB as usize] = 127;

        if mode == ResetMode::Full {
            self.pitch_wheel_sensitivity = DEFAULT_PITCH_WHEEL_SENSITIVITY;

            // 64 means "no change" for sound controllers, same as pan
            for index in cc::SOUND_CTRL1..=cc::SOUND_CTRL10 {
                self.values[index as usize] = 64;
            }

            self.values[cc::VOLUME_MSB as usize] = 100;
            self.values[cc::VOLUME_LSB as usize] = 0;
            self.values[cc::PAN_MSB as usize] = 64;
            self.values[cc::PAN_LSB as usize] = 0;

            // Reverb send (EFFECTS_DEPTH1) stays at zero rather than the
            // XG default of 40.
        }

        self.initialized = true;
    }

    /// Clear the NRPN addressing state.
    pub fn reset_nrpn(&mut self) {
        self.nrpn_select = 0;
        self.nrpn_active = false;
    }

    // =========================================================================
    // Controller values
    // =========================================================================

    #[inline]
    pub fn cc(&self, index: u8) -> u8 {
        self.values.get(index as usize).copied().unwrap_or(0)
    }

    /// Store a controller value, masked to 7 bits. Out-of-range indices are
    /// ignored.
    #[inline]
    pub fn set_cc(&mut self, index: u8, value: u8) {
        if let Some(slot) = self.values.get_mut(index as usize) {
            *slot = value & 0x7F;
        }
    }

    pub fn values(&self) -> &[u8; CC_COUNT] {
        &self.values
    }

    /// 14-bit value of an MSB/LSB controller pair.
    pub fn cc14(&self, msb: u8, lsb: u8) -> u16 {
        ((self.cc(msb) as u16) << 7) | self.cc(lsb) as u16
    }

    // =========================================================================
    // Scalar state
    // =========================================================================

    pub fn key_pressure(&self) -> u8 {
        self.key_pressure
    }

    pub fn set_key_pressure(&mut self, value: u8) {
        self.key_pressure = value & 0x7F;
    }

    pub fn channel_pressure(&self) -> u8 {
        self.channel_pressure
    }

    pub fn set_channel_pressure(&mut self, value: u8) {
        self.channel_pressure = value & 0x7F;
    }

    pub fn pitch_bend(&self) -> u16 {
        self.pitch_bend
    }

    /// Store a 14-bit pitch bend value.
    pub fn set_pitch_bend(&mut self, value: u16) {
        self.pitch_bend = value & 0x3FFF;
    }

    /// Pitch bend mapped to -1.0..=1.0 (slightly under 1.0 at the top).
    pub fn pitch_bend_normalized(&self) -> f32 {
        (self.pitch_bend as f32 - PITCH_BEND_CENTER as f32) / PITCH_BEND_CENTER as f32
    }

    pub fn pitch_wheel_sensitivity(&self) -> u8 {
        self.pitch_wheel_sensitivity
    }

    pub fn set_pitch_wheel_sensitivity(&mut self, semitones: u8) {
        self.pitch_wheel_sensitivity = semitones & 0x7F;
    }

    pub fn nrpn_select(&self) -> u16 {
        self.nrpn_select
    }

    pub fn set_nrpn_select(&mut self, value: u16) {
        self.nrpn_select = value;
    }

    pub fn nrpn_active(&self) -> bool {
        self.nrpn_active
    }

    pub fn set_nrpn_active(&mut self, active: bool) {
        self.nrpn_active = active;
    }
}

impl Default for ControllerBank {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ControllerBank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerBank")
            .field("volume", &self.cc(cc::VOLUME_MSB))
            .field("pan", &self.cc(cc::PAN_MSB))
            .field("expression", &self.cc(cc::EXPRESSION_MSB))
            .field("pitch_bend", &self.pitch_bend)
            .field("pitch_wheel_sensitivity", &self.pitch_wheel_sensitivity)
            .field("initialized", &self.initialized)
            .finish()
    }
}
