/// Number of synthesis generators a channel can override.
pub const GEN_COUNT: usize = 60;

/// One channel-level generator override.
///
/// A relative override is added to the instrument's value; an absolute one
/// replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GenOverride {
    pub value: f32,
    pub absolute: bool,
}

/// Per-channel generator override table. All entries are zero after
/// [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct GeneratorOverrides {
    entries: [GenOverride; GEN_COUNT],
}

impl GeneratorOverrides {
    pub fn new() -> Self {
        Self {
            entries: [GenOverride::default(); GEN_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(GenOverride::default());
    }

    pub fn get(&self, generator: usize) -> Option<GenOverride> {
        self.entries.get(generator).copied()
    }

    /// Set an override. Returns `false` for an unknown generator index.
    pub fn set(&mut self, generator: usize, value: f32, absolute: bool) -> bool {
        match self.entries.get_mut(generator) {
            Some(entry) => {
                *entry = GenOverride { value, absolute };
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenOverride> {
        self.entries.iter()
    }

    pub fn is_clear(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.value == 0.0 && !e.absolute)
    }
}

impl Default for GeneratorOverrides {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_clear() {
        assert!(GeneratorOverrides::new().is_clear());
    }

    #[test]
    fn test_set_and_clear() {
        let mut gens = GeneratorOverrides::new();
        assert!(gens.set(8, -1200.0, true));
        assert_eq!(
            gens.get(8),
            Some(GenOverride {
                value: -1200.0,
                absolute: true
            })
        );
        assert!(!gens.is_clear());

        gens.clear();
        assert!(gens.is_clear());
    }

    #[test]
    fn test_unknown_generator_rejected() {
        let mut gens = GeneratorOverrides::new();
        assert!(!gens.set(GEN_COUNT, 1.0, false));
        assert_eq!(gens.get(GEN_COUNT), None);
    }
}
