//! YUV4MPEG2 video carrier.
//!
//! Only the first frame carries the message. Its pixels are visited
//! row-major and each pixel contributes its Y, U and V samples, in that
//! order, so the stream must be 8-bit 4:4:4. Every later frame is copied
//! through untouched.

use crate::bits::{bits_to_text, text_to_bits};
use crate::error::{unreadable, write_failure};
use crate::lsb::{check_capacity, embed, TerminatorScan};
use crate::{
    force_extension, open_carrier, Capacity, Codec, Result, StegError, TerminatorPolicy,
};
use log::debug;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::iter::once;
use std::path::{Path, PathBuf};
use y4m::Colorspace;

#[derive(Debug, Default, Copy, Clone)]
pub struct VideoCodec {
    policy: TerminatorPolicy,
}

/// An owned copy of a decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VideoFrame {
    planes: [Vec<u8>; 3],
    raw_params: Option<Vec<u8>>,
}

impl VideoFrame {
    fn copy_of(frame: &y4m::Frame<'_>) -> Self {
        Self {
            planes: [
                frame.get_y_plane().to_vec(),
                frame.get_u_plane().to_vec(),
                frame.get_v_plane().to_vec(),
            ],
            raw_params: frame.get_raw_params().map(|params| params.to_vec()),
        }
    }

    fn pixel_count(&self) -> usize {
        self.planes[0].len()
    }

    /// Y, U and V samples of each pixel in turn.
    fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        let [y, u, v] = &self.planes;
        y.iter()
            .zip(u.iter())
            .zip(v.iter())
            .flat_map(|((y, u), v)| once(*y).chain(once(*u)).chain(once(*v)))
    }

    fn channels_mut(&mut self) -> impl Iterator<Item = &mut u8> {
        let [y, u, v] = &mut self.planes;
        y.iter_mut()
            .zip(u.iter_mut())
            .zip(v.iter_mut())
            .flat_map(|((y, u), v)| once(y).chain(once(u)).chain(once(v)))
    }

    fn as_frame(&self) -> y4m::Frame<'_> {
        let [y, u, v] = &self.planes;
        y4m::Frame::new([&y[..], &u[..], &v[..]], self.raw_params.clone())
    }
}

impl VideoCodec {
    pub fn new(policy: TerminatorPolicy) -> Self {
        Self { policy }
    }

    /// Hides `message` in the first frame of `input` and writes the whole
    /// stream to `output`. Returns the number of frames written.
    pub fn encode_to<R: Read, W: Write>(
        &self,
        input: R,
        message: &str,
        output: &mut W,
    ) -> Result<usize> {
        let mut decoder = open_stream(input)?;
        let frame = self.embed_first_frame(&mut decoder, message)?;
        write_stream(&mut decoder, &frame, output)
    }

    /// Recovers the message from the first frame of `input`. Later frames
    /// are never read.
    pub fn decode_from<R: Read>(&self, input: R) -> Result<String> {
        let mut decoder = open_stream(input)?;
        let frame = read_frame(&mut decoder)?.ok_or_else(|| {
            StegError::UnreadableCarrier("could not read first video frame".to_string())
        })?;
        self.extract(&frame)
    }

    pub(crate) fn extract(&self, frame: &VideoFrame) -> Result<String> {
        let mut scan = TerminatorScan::new();

        if scan.scan(frame.channels()) {
            return Ok(bits_to_text(&scan.into_payload()));
        }

        debug!("no terminator in {} first frame positions", scan.len());

        match self.policy {
            TerminatorPolicy::Strict => Err(StegError::TerminatorNotFound),
            TerminatorPolicy::Lenient => Ok(bits_to_text(&scan.into_bits())),
        }
    }

    pub(crate) fn embed(&self, frame: &mut VideoFrame, message: &str) -> Result<()> {
        let bits = text_to_bits(message)?;
        check_capacity(bits.len(), frame.pixel_count() * 3)?;
        embed(frame.channels_mut(), &bits);
        Ok(())
    }

    fn embed_first_frame<R: Read>(
        &self,
        decoder: &mut y4m::Decoder<R>,
        message: &str,
    ) -> Result<VideoFrame> {
        let mut frame = read_frame(decoder)?.ok_or(StegError::NoFramesAvailable)?;
        self.embed(&mut frame, message)?;

        debug!(
            "embedded {} characters into first frame ({}x{})",
            message.chars().count(),
            decoder.get_width(),
            decoder.get_height()
        );
        Ok(frame)
    }
}

impl Codec for VideoCodec {
    fn encode(&self, source: &Path, message: &str, dest: &Path) -> Result<PathBuf> {
        let mut decoder = open_stream(open_carrier(source)?)?;
        let frame = self.embed_first_frame(&mut decoder, message)?;

        let output_path = force_extension(dest, "y4m");
        let mut writer = BufWriter::new(File::create(&output_path)?);

        match write_stream(&mut decoder, &frame, &mut writer) {
            Ok(frames) => {
                debug!(
                    "stego video written to {} ({} frames)",
                    output_path.display(),
                    frames
                );
                Ok(output_path)
            }
            Err(err) => {
                drop(writer);
                let _ = fs::remove_file(&output_path);
                Err(err)
            }
        }
    }

    fn decode(&self, source: &Path) -> Result<String> {
        self.decode_from(open_carrier(source)?)
    }

    fn capacity(&self, source: &Path) -> Result<Capacity> {
        let decoder = open_stream(open_carrier(source)?)?;
        Ok(Capacity::new(decoder.get_width() * decoder.get_height() * 3))
    }
}

fn open_stream<R: Read>(input: R) -> Result<y4m::Decoder<R>> {
    let decoder = y4m::decode(input).map_err(unreadable)?;

    match decoder.get_colorspace() {
        Colorspace::C444 => Ok(decoder),
        other => Err(StegError::UnsupportedFormat(format!(
            "only 8-bit 4:4:4 video is supported, got {:?}",
            other
        ))),
    }
}

fn read_frame<R: Read>(decoder: &mut y4m::Decoder<R>) -> Result<Option<VideoFrame>> {
    match decoder.read_frame() {
        Ok(frame) => Ok(Some(VideoFrame::copy_of(&frame))),
        Err(y4m::Error::EOF) => Ok(None),
        Err(err) => Err(unreadable(err)),
    }
}

/// Writes the header, `first`, then every frame still left in `decoder`.
fn write_stream<R: Read, W: Write>(
    decoder: &mut y4m::Decoder<R>,
    first: &VideoFrame,
    output: &mut W,
) -> Result<usize> {
    let mut encoder = y4m::encode(
        decoder.get_width(),
        decoder.get_height(),
        decoder.get_framerate(),
    )
    .with_colorspace(decoder.get_colorspace())
    .with_pixel_aspect(decoder.get_pixel_aspect())
    .write_header(&mut *output)
    .map_err(write_failure)?;

    encoder
        .write_frame(&first.as_frame())
        .map_err(write_failure)?;
    let mut frames = 1;

    loop {
        match decoder.read_frame() {
            Ok(frame) => encoder.write_frame(&frame).map_err(write_failure)?,
            Err(y4m::Error::EOF) => break,
            Err(err) => return Err(unreadable(err)),
        }
        frames += 1;
    }

    drop(encoder);
    output.flush()?;
    Ok(frames)
}

#[cfg(test)]
pub(crate) fn create_test_video(width: usize, height: usize, frames: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut encoder = y4m::encode(width, height, y4m::Ratio::new(25, 1))
        .with_colorspace(Colorspace::C444)
        .write_header(&mut out)
        .expect("no error");

    for index in 0..frames {
        let plane = |seed: usize| -> Vec<u8> {
            (0..width * height)
                .map(|i| ((i * 7 + index * 13 + seed) % 256) as u8)
                .collect()
        };
        let (y, u, v) = (plane(0), plane(85), plane(170));
        encoder
            .write_frame(&y4m::Frame::new([&y, &u, &v], None))
            .expect("no error");
    }

    drop(encoder);
    out
}
