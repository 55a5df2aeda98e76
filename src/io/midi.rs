/// Channel-voice messages that change per-channel state.
///
/// Note on/off are not here: they belong to the voice pipeline, not the
/// channel state core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// 14-bit value, 0x2000 is centre.
    PitchBend { channel: u8, value: u16 },
    ChannelPressure { channel: u8, value: u8 },
    KeyPressure { channel: u8, key: u8, value: u8 },
}

impl MidiEvent {
    /// Decode a raw MIDI message. Returns `None` for anything that is not a
    /// channel-state message (notes, system messages, truncated input).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let channel = status & 0x0F;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        match status & 0xF0 {
            0xA0 => Some(MidiEvent::KeyPressure {
                channel,
                key: data(1)?,
                value: data(2)?,
            }),
            0xB0 => Some(MidiEvent::ControlChange {
                channel,
                controller: data(1)?,
                value: data(2)?,
            }),
            0xC0 => Some(MidiEvent::ProgramChange {
                channel,
                program: data(1)?,
            }),
            0xD0 => Some(MidiEvent::ChannelPressure {
                channel,
                value: data(1)?,
            }),
            0xE0 => Some(MidiEvent::PitchBend {
                channel,
                value: (data(2)? as u16) << 7 | data(1)? as u16,
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::ControlChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ChannelPressure { channel, .. }
            | MidiEvent::KeyPressure { channel, .. } => channel,
        }
    }
}
