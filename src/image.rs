//! Still image carrier.
//!
//! Positions are the colour channels of every pixel, row-major, channel 0
//! to 2 within a pixel. Alpha is never used. Stego images are always written
//! as PNG since any lossy re-encoding wipes the low bits.

use crate::bits::{bits_to_text, text_to_bits};
use crate::error::{unreadable, write_failure};
use crate::lsb::{check_capacity, embed, TerminatorScan};
use crate::{
    force_extension, open_carrier, Capacity, Codec, Result, StegError, TerminatorPolicy,
};
use ::image::{DynamicImage, GenericImageView, ImageFormat};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

const COLOUR_CHANNELS: usize = 3;

#[derive(Debug, Default, Copy, Clone)]
pub struct ImageCodec {
    policy: TerminatorPolicy,
}

impl ImageCodec {
    pub fn new(policy: TerminatorPolicy) -> Self {
        Self { policy }
    }

    /// Number of channel positions in `image`.
    pub fn positions(image: &DynamicImage) -> usize {
        let (width, height) = image.dimensions();
        (width as usize) * (height as usize) * COLOUR_CHANNELS
    }

    /// Hides `message` in a copy of `image`'s pixels.
    pub fn embed(&self, image: &DynamicImage, message: &str) -> Result<DynamicImage> {
        let bits = text_to_bits(message)?;
        check_capacity(bits.len(), Self::positions(image))?;

        debug!(
            "embedding {} characters ({} bits) into image",
            message.chars().count(),
            bits.len()
        );

        if image.color().has_alpha() {
            let mut rgba = image.to_rgba8();
            embed(colour_channels_mut(&mut rgba, 4), &bits);
            Ok(DynamicImage::ImageRgba8(rgba))
        } else {
            let mut rgb = image.to_rgb8();
            embed(colour_channels_mut(&mut rgb, 3), &bits);
            Ok(DynamicImage::ImageRgb8(rgb))
        }
    }

    /// Reads the hidden message back out of `image`.
    pub fn extract(&self, image: &DynamicImage) -> Result<String> {
        let mut scan = TerminatorScan::new();

        let found = if image.color().has_alpha() {
            scan.scan(colour_channels(&image.to_rgba8(), 4))
        } else {
            scan.scan(colour_channels(&image.to_rgb8(), 3))
        };

        if found {
            return Ok(bits_to_text(&scan.into_payload()));
        }

        debug!("no terminator in {} image positions", scan.len());

        match self.policy {
            TerminatorPolicy::Strict => Err(StegError::TerminatorNotFound),
            TerminatorPolicy::Lenient => Ok(bits_to_text(&scan.into_bits())),
        }
    }

    pub fn encode_to<R: BufRead + Seek, W: Write>(
        &self,
        input: R,
        message: &str,
        output: &mut W,
    ) -> Result<()> {
        let cover = load(input)?;
        let stego = self.embed(&cover, message)?;
        write_png(&stego, output)
    }

    pub fn decode_from<R: BufRead + Seek>(&self, input: R) -> Result<String> {
        let image = load(input)?;
        self.extract(&image)
    }
}

impl Codec for ImageCodec {
    fn encode(&self, source: &Path, message: &str, dest: &Path) -> Result<PathBuf> {
        let cover = load(open_carrier(source)?)?;
        let stego = self.embed(&cover, message)?;

        let output_path = force_extension(dest, "png");
        let mut writer = BufWriter::new(File::create(&output_path)?);
        write_png(&stego, &mut writer)?;
        writer.flush()?;

        debug!("stego image written to {}", output_path.display());
        Ok(output_path)
    }

    fn decode(&self, source: &Path) -> Result<String> {
        self.decode_from(open_carrier(source)?)
    }

    fn capacity(&self, source: &Path) -> Result<Capacity> {
        let image = load(open_carrier(source)?)?;
        Ok(Capacity::new(Self::positions(&image)))
    }
}

fn load<R: BufRead + Seek>(input: R) -> Result<DynamicImage> {
    ::image::io::Reader::new(input)
        .with_guessed_format()?
        .decode()
        .map_err(unreadable)
}

fn write_png<W: Write>(image: &DynamicImage, output: &mut W) -> Result<()> {
    image
        .write_to(output, ImageFormat::Png)
        .map_err(write_failure)
}

fn colour_channels_mut(pixels: &mut [u8], stride: usize) -> impl Iterator<Item = &mut u8> {
    pixels
        .chunks_exact_mut(stride)
        .flat_map(|pixel| pixel[..COLOUR_CHANNELS].iter_mut())
}

fn colour_channels(pixels: &[u8], stride: usize) -> impl Iterator<Item = u8> + '_ {
    pixels
        .chunks_exact(stride)
        .flat_map(|pixel| pixel[..COLOUR_CHANNELS].iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Rgb, Rgba};
    use std::io::Cursor;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn bytes_of(image: &DynamicImage) -> Vec<u8> {
        image.to_rgb8().into_raw()
    }

    #[test]
    fn test_four_by_four_capacity_scenario() {
        let codec = ImageCodec::default();
        let image = create_test_image(4, 4);
        assert_eq!(48, ImageCodec::positions(&image));

        let one = codec.embed(&image, "A").expect("no error");
        assert_eq!("A", codec.extract(&one).expect("no error"));

        let full = codec.embed(&image, "ABCD").expect("no error");
        assert_eq!("ABCD", codec.extract(&full).expect("no error"));

        match codec.embed(&image, "ABCDE") {
            Err(StegError::InsufficientCapacity {
                required,
                available,
            }) => {
                assert_eq!(56, required);
                assert_eq!(48, available);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_row_major_channel_order() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(3, 3, Rgb([0, 0, 0])));
        let stego = ImageCodec::default().embed(&image, "").expect("no error");
        let rgb = stego.to_rgb8();

        // 15 ones then a zero: first five pixels fully set, sixth is (0, 0, 0)
        for (i, pixel) in rgb.pixels().enumerate() {
            match i {
                0..=4 => assert_eq!(&Rgb([1, 1, 1]), pixel),
                _ => assert_eq!(&Rgb([0, 0, 0]), pixel),
            }
        }
        assert_eq!(&Rgb([1, 1, 1]), rgb.get_pixel(2, 0));
        assert_eq!(&Rgb([0, 0, 0]), rgb.get_pixel(0, 2));
    }

    #[test]
    fn test_tail_untouched() {
        let image = create_test_image(20, 20);
        let stego = ImageCodec::default().embed(&image, "tail").expect("no error");

        let before = bytes_of(&image);
        let after = bytes_of(&stego);
        let used = crate::bits::bitstream_len(4);

        assert_eq!(before[used..], after[used..]);
        for (b, a) in before[..used].iter().zip(&after[..used]) {
            assert_eq!(b & 0xFE, a & 0xFE);
        }
        let embedded: Vec<u8> = after[used - 16..used].iter().map(|v| v & 1).collect();
        assert_eq!(crate::TERMINATOR.to_vec(), embedded);
    }

    #[test]
    fn test_alpha_preserved() {
        let image = DynamicImage::ImageRgba8(ImageBuffer::from_fn(10, 10, |x, y| {
            Rgba([(x * 20) as u8, (y * 20) as u8, 128, (x + y) as u8 * 7])
        }));
        let codec = ImageCodec::default();
        let stego = codec.embed(&image, "alpha").expect("no error");

        assert!(stego.color().has_alpha());
        let alpha_before: Vec<u8> = image.to_rgba8().pixels().map(|p| p[3]).collect();
        let alpha_after: Vec<u8> = stego.to_rgba8().pixels().map(|p| p[3]).collect();
        assert_eq!(alpha_before, alpha_after);
        assert_eq!("alpha", codec.extract(&stego).expect("no error"));
    }

    #[test]
    fn test_empty_message() {
        let codec = ImageCodec::default();
        let stego = codec.embed(&create_test_image(8, 8), "").expect("no error");
        assert_eq!("", codec.extract(&stego).expect("no error"));
    }

    #[test]
    fn test_untouched_image_has_no_message() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(16, 16, Rgb([10, 20, 30])));
        let result = ImageCodec::default().extract(&image);
        assert!(matches!(result, Err(StegError::TerminatorNotFound)));
    }

    #[test]
    fn test_lenient_returns_raw_bits() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([0x41, 0x41, 0x41])));
        let decoded = ImageCodec::new(TerminatorPolicy::Lenient)
            .extract(&image)
            .expect("no error");

        // 48 set bits, no terminator
        assert_eq!("\u{ff}".repeat(6), decoded);
    }

    #[test]
    fn test_png_round_trip_in_memory() {
        let mut cover: Vec<u8> = Vec::new();
        create_test_image(32, 32)
            .write_to(&mut cover, ImageFormat::Png)
            .expect("no error");

        let codec = ImageCodec::default();
        let mut stego: Vec<u8> = Vec::new();
        codec
            .encode_to(Cursor::new(cover), "Hey!", &mut stego)
            .expect("no error");

        let decoded = codec.decode_from(Cursor::new(stego)).expect("no error");
        assert_eq!("Hey!", decoded);
    }

    #[test]
    fn test_garbage_input_is_unreadable() {
        let result = ImageCodec::default().decode_from(Cursor::new(b"not an image".to_vec()));
        assert!(matches!(result, Err(StegError::UnreadableCarrier(_))));
    }
}
