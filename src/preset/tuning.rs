/// Microtuning table: one pitch (in cents) per MIDI key.
///
/// Tables are shared between channels through `Arc`. A channel releasing
/// its handle on the render thread must go through the reclaimer, since the
/// last handle frees the table.
#[derive(Debug, Clone)]
pub struct TuningTable {
    name: String,
    bank: u8,
    program: u8,
    pitch: [f64; 128],
}

impl TuningTable {
    /// Standard 12-tone equal temperament (key * 100 cents).
    pub fn equal_temperament(name: impl Into<String>, bank: u8, program: u8) -> Self {
        Self {
            name: name.into(),
            bank,
            program,
            pitch: std::array::from_fn(|key| key as f64 * 100.0),
        }
    }

    /// Build from an octave of 12 per-degree deviations (cents) from equal
    /// temperament.
    pub fn from_octave(name: impl Into<String>, bank: u8, program: u8, octave: &[f64; 12]) -> Self {
        Self {
            name: name.into(),
            bank,
            program,
            pitch: std::array::from_fn(|key| key as f64 * 100.0 + octave[key % 12]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    /// Pitch of a key in cents. Keys above 127 clamp to 127.
    pub fn pitch(&self, key: u8) -> f64 {
        self.pitch[(key as usize).min(127)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_temperament() {
        let t = TuningTable::equal_temperament("12-TET", 0, 0);
        assert_eq!(t.pitch(60), 6000.0);
        assert_eq!(t.pitch(255), 12700.0);
    }

    #[test]
    fn test_octave_deviation_repeats() {
        let mut octave = [0.0; 12];
        octave[4] = -13.7;
        let t = TuningTable::from_octave("just-ish", 0, 1, &octave);
        assert!((t.pitch(64) - 6386.3).abs() < 1e-9);
        assert!((t.pitch(76) - 7586.3).abs() < 1e-9);
        assert_eq!(t.pitch(60), 6000.0);
    }
}
