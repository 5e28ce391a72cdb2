//! WAV carrier. Every interleaved 16-bit sample slot is one position, in
//! file order.

use crate::bits::{bits_to_text, text_to_bits};
use crate::error::{unreadable, write_failure};
use crate::lsb::{check_capacity, embed, TerminatorScan};
use crate::{open_carrier, Capacity, Codec, Result, StegError, TerminatorPolicy};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Default number of samples a decode examines before giving up.
pub const AUDIO_SCAN_LIMIT: usize = 100_000;

/// Bits kept by a lenient decode that never met the terminator.
pub const LENIENT_AUDIO_BITS: usize = 10_000;

/// Decoded 16-bit PCM samples plus the container parameters to write them back with.
#[derive(Debug, Clone)]
pub struct AudioCarrier {
    spec: WavSpec,
    samples: Vec<i16>,
}

impl AudioCarrier {
    pub fn new(spec: WavSpec, samples: Vec<i16>) -> Self {
        Self { spec, samples }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = WavReader::new(reader).map_err(unreadable)?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(StegError::UnsupportedFormat(format!(
                "only 16-bit PCM WAV is supported, got {} bits {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(unreadable)?;

        debug!(
            "read {} samples ({} channels, {} Hz)",
            samples.len(),
            spec.channels,
            spec.sample_rate
        );

        Ok(Self { spec, samples })
    }

    pub fn write_to<W: Write + Seek>(&self, output: &mut W) -> Result<()> {
        let mut writer = WavWriter::new(&mut *output, self.spec).map_err(write_failure)?;
        for sample in &self.samples {
            writer.write_sample(*sample).map_err(write_failure)?;
        }
        writer.finalize().map_err(write_failure)?;
        output.flush()?;
        Ok(())
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

#[derive(Debug, Copy, Clone)]
pub struct AudioCodec {
    policy: TerminatorPolicy,
    scan_limit: usize,
}

impl Default for AudioCodec {
    fn default() -> Self {
        Self::new(TerminatorPolicy::default())
    }
}

impl AudioCodec {
    pub fn new(policy: TerminatorPolicy) -> Self {
        Self {
            policy,
            scan_limit: AUDIO_SCAN_LIMIT,
        }
    }

    /// Caps how many samples [`AudioCodec::extract`] will look at.
    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Takes ownership of `carrier` and returns it with `message` embedded.
    pub fn embed(&self, mut carrier: AudioCarrier, message: &str) -> Result<AudioCarrier> {
        let bits = text_to_bits(message)?;
        check_capacity(bits.len(), carrier.samples.len())?;

        if bits.len() > self.scan_limit {
            warn!(
                "message needs {} samples but decoding only scans the first {}",
                bits.len(),
                self.scan_limit
            );
        }

        debug!(
            "encoding {} bits into {} audio samples",
            bits.len(),
            carrier.samples.len()
        );

        embed(carrier.samples.iter_mut(), &bits);
        Ok(carrier)
    }

    pub fn extract(&self, carrier: &AudioCarrier) -> Result<String> {
        let limit = carrier.samples.len().min(self.scan_limit);
        let mut scan = TerminatorScan::new();

        if scan.scan(carrier.samples[..limit].iter().copied()) {
            let payload = scan.into_payload();
            debug!("decoded {} bits from audio", payload.len());
            return Ok(bits_to_text(&payload));
        }

        debug!("no terminator in the first {} samples", limit);

        match self.policy {
            TerminatorPolicy::Strict => Err(StegError::TerminatorNotFound),
            TerminatorPolicy::Lenient => {
                let mut bits = scan.into_bits();
                bits.truncate(LENIENT_AUDIO_BITS);
                Ok(bits_to_text(&bits))
            }
        }
    }
}

impl Codec for AudioCodec {
    fn encode(&self, source: &Path, message: &str, dest: &Path) -> Result<PathBuf> {
        let carrier = AudioCarrier::from_reader(open_carrier(source)?)?;
        let stego = self.embed(carrier, message)?;

        let mut writer = BufWriter::new(File::create(dest)?);
        stego.write_to(&mut writer)?;

        debug!("stego audio written to {}", dest.display());
        Ok(dest.to_path_buf())
    }

    fn decode(&self, source: &Path) -> Result<String> {
        let carrier = AudioCarrier::from_reader(open_carrier(source)?)?;
        self.extract(&carrier)
    }

    fn capacity(&self, source: &Path) -> Result<Capacity> {
        let reader = WavReader::new(open_carrier(source)?).map_err(unreadable)?;
        Ok(Capacity::new(reader.len() as usize))
    }
}

#[cfg(test)]
pub(crate) fn create_test_audio(sample_count: usize) -> AudioCarrier {
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let samples: Vec<i16> = (0..sample_count)
        .map(|i| {
            let t = (i / 2) as f64 / 44100.0;
            (f64::sin(2.0 * std::f64::consts::PI * 440.0 * t) * 16000.0) as i16
        })
        .collect();

    AudioCarrier::new(spec, samples)
}
