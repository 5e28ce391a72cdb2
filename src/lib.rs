//! Hide short text messages in the least significant bits of images, WAV
//! audio and Y4M video.
//!
//! Every carrier uses the same scheme: the message is serialized with
//! [`bits::text_to_bits`], one bit per carrier position, and closed with the
//! 16-bit [`TERMINATOR`]. Carriers differ only in how their positions are
//! traversed and persisted. The hidden bits are plain text; anyone who knows
//! the scheme can read them.

pub mod audio;
pub mod bits;
pub mod carrier;
pub mod error;
pub mod image;
pub mod lsb;
pub mod video;

pub use crate::audio::{AudioCarrier, AudioCodec, AUDIO_SCAN_LIMIT, LENIENT_AUDIO_BITS};
pub use crate::carrier::CarrierKind;
pub use crate::error::{Result, StegError};
pub use crate::image::ImageCodec;
pub use crate::video::VideoCodec;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// End of message marker, shared by every carrier kind.
pub const TERMINATOR: [u8; 16] = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0];

/// What a decoder does when its scan never meets the terminator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TerminatorPolicy {
    /// Fail with [`StegError::TerminatorNotFound`].
    Strict,
    /// Decode whatever bits were read. Usually garbage.
    Lenient,
}

impl Default for TerminatorPolicy {
    fn default() -> Self {
        TerminatorPolicy::Strict
    }
}

/// How much a carrier can hold.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capacity {
    /// Positions available for message bits.
    pub positions: usize,
}

impl Capacity {
    pub fn new(positions: usize) -> Self {
        Self { positions }
    }

    /// Longest message, in characters, that fits alongside the terminator.
    pub fn max_message_len(&self) -> usize {
        self.positions.saturating_sub(TERMINATOR.len()) / 8
    }
}

/// File level contract implemented by every carrier codec.
pub trait Codec {
    /// Hides `message` in the carrier at `source` and writes the result.
    /// Returns the path actually written, which may differ from `dest` when
    /// the codec forces a lossless extension.
    fn encode(&self, source: &Path, message: &str, dest: &Path) -> Result<PathBuf>;

    fn decode(&self, source: &Path) -> Result<String>;

    fn capacity(&self, source: &Path) -> Result<Capacity>;
}

pub(crate) fn open_carrier(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(err) => Err(StegError::UnreadableCarrier(format!(
            "{}: {}",
            path.display(),
            err
        ))),
    }
}

/// Replaces the extension of `dest` with `extension` unless it already
/// matches, ignoring case.
pub(crate) fn force_extension(dest: &Path, extension: &str) -> PathBuf {
    match dest.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(extension) => dest.to_path_buf(),
        _ => dest.with_extension(extension),
    }
}
