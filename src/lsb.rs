use crate::{Result, StegError, TERMINATOR};
use log::debug;

/// A raw carrier value whose lowest bit can carry one message bit.
pub trait LsbSample: Copy {
    fn lsb(self) -> u8;
    fn with_lsb(self, bit: u8) -> Self;
}

impl LsbSample for u8 {
    fn lsb(self) -> u8 {
        self & 0x01
    }

    fn with_lsb(self, bit: u8) -> Self {
        (self & 0xFE) | (bit & 0x01)
    }
}

impl LsbSample for i16 {
    fn lsb(self) -> u8 {
        (self & 1) as u8
    }

    fn with_lsb(self, bit: u8) -> Self {
        (self & !1) | i16::from(bit & 0x01)
    }
}

/// Writes `bits` into the low bits of successive positions, leaving everything
/// after the last bit untouched. Returns the number of positions written.
pub fn embed<'a, S, I>(positions: I, bits: &[u8]) -> usize
where
    S: LsbSample + 'a,
    I: IntoIterator<Item = &'a mut S>,
{
    let mut written = 0;
    for (sample, bit) in positions.into_iter().zip(bits) {
        *sample = sample.with_lsb(*bit);
        written += 1;
    }
    written
}

/// Make sure that the bitstream fits into the carrier's positions.
pub fn check_capacity(required: usize, available: usize) -> Result<()> {
    let utilisation = ((required as f64) / (available.max(1) as f64)) * 100.0;

    debug!(
        "carrier positions: {}, bitstream length: {}, carrier utilisation: {:.4}%",
        available, required, utilisation,
    );

    if required <= available {
        Ok(())
    } else {
        Err(StegError::InsufficientCapacity {
            required,
            available,
        })
    }
}

/// Accumulates extracted bits and reports the moment the terminator shows up.
#[derive(Debug, Default)]
pub struct TerminatorScan {
    bits: Vec<u8>,
}

impl TerminatorScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bit; true once the latest 16 bits equal the terminator.
    pub fn push(&mut self, bit: u8) -> bool {
        self.bits.push(bit & 0x01);
        self.bits.ends_with(&TERMINATOR)
    }

    /// Feeds samples until the terminator is seen. True if it was.
    pub fn scan<S, I>(&mut self, samples: I) -> bool
    where
        S: LsbSample,
        I: IntoIterator<Item = S>,
    {
        samples.into_iter().any(|sample| self.push(sample.lsb()))
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Accumulated bits with a trailing terminator stripped.
    pub fn into_payload(mut self) -> Vec<u8> {
        if self.bits.ends_with(&TERMINATOR) {
            self.bits.truncate(self.bits.len() - TERMINATOR.len());
        }
        self.bits
    }

    /// Every accumulated bit, as read.
    pub fn into_bits(self) -> Vec<u8> {
        self.bits
    }
}
