//! Text ⇄ bitstream conversion shared by every carrier codec.
//!
//! Each character is written as its 8-bit code point, most significant bit
//! first, and the stream is closed by [`TERMINATOR`]. Only characters in
//! U+0000..=U+00FF can be represented.

use crate::{Result, StegError, TERMINATOR};

/// Number of bits needed to embed a message of `message_len` characters.
pub fn bitstream_len(message_len: usize) -> usize {
    message_len * 8 + TERMINATOR.len()
}

/// Serializes `message` into one `0`/`1` value per element, terminator included.
pub fn text_to_bits(message: &str) -> Result<Vec<u8>> {
    let mut bits = Vec::with_capacity(bitstream_len(message.chars().count()));

    for (position, character) in message.chars().enumerate() {
        let code = character as u32;
        if code > 0xFF {
            return Err(StegError::UnencodableCharacter {
                character,
                position,
            });
        }
        bits.extend_from_slice(&split_byte(code as u8));
    }

    bits.extend_from_slice(&TERMINATOR);
    Ok(bits)
}

/// Rebuilds text from 8-bit groups. A trailing partial group is dropped.
pub fn bits_to_text(bits: &[u8]) -> String {
    bits.chunks_exact(8)
        .map(|chunk| char::from(merge_byte(chunk)))
        .collect()
}

fn split_byte(byte: u8) -> [u8; 8] {
    [
        (byte >> 7) & 0x01,
        (byte >> 6) & 0x01,
        (byte >> 5) & 0x01,
        (byte >> 4) & 0x01,
        (byte >> 3) & 0x01,
        (byte >> 2) & 0x01,
        (byte >> 1) & 0x01,
        byte & 0x01,
    ]
}

fn merge_byte(bits: &[u8]) -> u8 {
    (bits[0] << 7) & 0x80
        | (bits[1] << 6) & 0x40
        | (bits[2] << 5) & 0x20
        | (bits[3] << 4) & 0x10
        | (bits[4] << 3) & 0x08
        | (bits[5] << 2) & 0x04
        | (bits[6] << 1) & 0x02
        | (bits[7] & 0x01)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_merge() {
        test_split_merge_byte(0xFF, [1, 1, 1, 1, 1, 1, 1, 1]);
        test_split_merge_byte(0x00, [0, 0, 0, 0, 0, 0, 0, 0]);
        test_split_merge_byte(0x41, [0, 1, 0, 0, 0, 0, 0, 1]);
        test_split_merge_byte(0xEC, [1, 1, 1, 0, 1, 1, 0, 0]);
        test_split_merge_byte(0x0F, [0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_text_to_bits_appends_terminator() {
        let bits = text_to_bits("A").expect("no error");

        assert_eq!(24, bits.len());
        assert_eq!(&[0, 1, 0, 0, 0, 0, 0, 1], &bits[..8]);
        assert_eq!(&TERMINATOR[..], &bits[8..]);
    }

    #[test]
    fn test_empty_message_is_only_terminator() {
        let bits = text_to_bits("").expect("no error");
        assert_eq!(TERMINATOR.to_vec(), bits);
    }

    #[test]
    fn test_bits_to_text_drops_partial_group() {
        let mut bits = text_to_bits("Hi").expect("no error");
        bits.truncate(16);
        bits.extend_from_slice(&[1, 0, 1]);

        assert_eq!("Hi", bits_to_text(&bits));
    }

    #[test]
    fn test_latin1_round_trip() {
        let message = "caf\u{e9} \u{ff}\u{0}~";
        let bits = text_to_bits(message).expect("no error");

        assert_eq!(bitstream_len(message.chars().count()), bits.len());
        assert_eq!(message, bits_to_text(&bits[..bits.len() - TERMINATOR.len()]));
    }

    #[test]
    fn test_wide_character_rejected() {
        match text_to_bits("ok\u{20ac}") {
            Err(StegError::UnencodableCharacter {
                character,
                position,
            }) => {
                assert_eq!('\u{20ac}', character);
                assert_eq!(2, position);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    fn test_split_merge_byte(input: u8, expected: [u8; 8]) {
        let split = split_byte(input);
        assert_eq!(expected, split);
        assert_eq!(input, merge_byte(&split));
    }
}
