use std::sync::atomic::{AtomicU32, Ordering};

/*
Packed Selector Register
========================

Which instrument a channel plays is named by three numbers: the source
(which loaded instrument bank file), the MIDI bank, and the MIDI program.
They live together in one 32-bit word so a reader always sees a triple
that existed at a single instant.

Layout
------

   31                 21 20        14 13         7 6          0
  ┌─────────────────────┬────────────┬────────────┬────────────┐
  │   source (11 bits)  │  bank MSB  │  bank LSB  │  program   │
  └─────────────────────┴────────────┴────────────┴────────────┘
                        └──────── bank (14) ──────┘

Updating
--------

Writers never lock. Every update is a compare-and-swap loop:

    loop {
        current = load()
        wanted  = (candidate & !keep) | (current & keep)
        if wanted == current      -> done (nothing to change)
        if cas(current, wanted)   -> done
        // someone else wrote in between, try again on their value
    }

`keep` holds the bits of every field the caller did not name, so a
concurrent writer touching a different field is never overwritten.
*/

const PROGRAM_SHIFT: u32 = 0;
const BANK_SHIFT: u32 = 7;
const BANK_MSB_SHIFT: u32 = 14;
const SOURCE_SHIFT: u32 = 21;

const PROGRAM_MASK: u32 = 0x0000_007F;
const BANK_MASK: u32 = 0x001F_FF80;
const BANK_LSB_MASK: u32 = 0x0000_3F80;
const BANK_MSB_MASK: u32 = 0x001F_C000;
const SOURCE_MASK: u32 = 0xFFE0_0000;

/// Largest representable source id (11 bits).
pub const MAX_SOURCE: u16 = 0x07FF;
/// Largest representable bank (14 bits).
pub const MAX_BANK: u16 = 0x3FFF;
/// Largest representable program (7 bits).
pub const MAX_PROGRAM: u8 = 0x7F;

/// A decoded {source, bank, program} triple.
///
/// Out-of-range values are truncated to their field width when packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector {
    pub source: u16,
    pub bank: u16,
    pub program: u8,
}

impl Selector {
    pub const fn new(source: u16, bank: u16, program: u8) -> Self {
        Self {
            source,
            bank,
            program,
        }
    }

    /// Encode into the register word.
    #[inline]
    pub const fn pack(self) -> u32 {
        (((self.source as u32) << SOURCE_SHIFT) & SOURCE_MASK)
            | (((self.bank as u32) << BANK_SHIFT) & BANK_MASK)
            | (((self.program as u32) << PROGRAM_SHIFT) & PROGRAM_MASK)
    }

    /// Decode a register word.
    #[inline]
    pub const fn unpack(word: u32) -> Self {
        Self {
            source: ((word & SOURCE_MASK) >> SOURCE_SHIFT) as u16,
            bank: ((word & BANK_MASK) >> BANK_SHIFT) as u16,
            program: ((word & PROGRAM_MASK) >> PROGRAM_SHIFT) as u8,
        }
    }

    pub const fn bank_lsb(&self) -> u8 {
        (self.bank & 0x7F) as u8
    }

    pub const fn bank_msb(&self) -> u8 {
        ((self.bank >> 7) & 0x7F) as u8
    }
}

/// Lock-free register holding a channel's [`Selector`].
///
/// Safe to write from any number of control threads while the render
/// thread reads it. Share it with `Arc`.
#[derive(Debug, Default)]
pub struct SelectorRegister {
    word: AtomicU32,
}

impl SelectorRegister {
    pub fn new(selector: Selector) -> Self {
        Self {
            word: AtomicU32::new(selector.pack()),
        }
    }

    /// Snapshot of all three fields, taken with a single load.
    #[inline]
    pub fn get(&self) -> Selector {
        Selector::unpack(self.word.load(Ordering::Acquire))
    }

    /// The opaque register word (diagnostics only).
    #[inline]
    pub fn raw(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }

    /// Replace any combination of fields; `None` keeps the current value.
    pub fn set(&self, source: Option<u16>, bank: Option<u16>, program: Option<u8>) {
        let candidate = Selector::new(
            source.unwrap_or(0),
            bank.unwrap_or(0),
            program.unwrap_or(0),
        )
        .pack();

        let keep = (if source.is_some() { 0 } else { SOURCE_MASK })
            | (if bank.is_some() { 0 } else { BANK_MASK })
            | (if program.is_some() { 0 } else { PROGRAM_MASK });

        self.update(|current| (candidate & !keep) | (current & keep));
    }

    /// Overwrite the whole triple.
    pub fn store(&self, selector: Selector) {
        self.set(
            Some(selector.source),
            Some(selector.bank),
            Some(selector.program),
        );
    }

    /// Replace the low 7 bits of the bank (MIDI CC 32).
    pub fn set_bank_lsb(&self, lsb: u8) {
        let bits = ((lsb as u32) << BANK_SHIFT) & BANK_LSB_MASK;
        self.update(|current| (current & !BANK_LSB_MASK) | bits);
    }

    /// Replace the high 7 bits of the bank (MIDI CC 0).
    pub fn set_bank_msb(&self, msb: u8) {
        let bits = ((msb as u32) << BANK_MSB_SHIFT) & BANK_MSB_MASK;
        self.update(|current| (current & !BANK_MSB_MASK) | bits);
    }

    /// CAS retry loop. Stops once the word holds `merge(current)`.
    #[inline]
    fn update(&self, merge: impl Fn(u32) -> u32) {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let wanted = merge(current);
            if wanted == current {
                return;
            }
            match self.word.compare_exchange_weak(
                current,
                wanted,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}
