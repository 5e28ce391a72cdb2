//! Picks the codec for a carrier file.

use crate::{AudioCodec, Codec, ImageCodec, TerminatorPolicy, VideoCodec};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CarrierKind {
    Image,
    Audio,
    Video,
}

impl CarrierKind {
    pub const ALL: [CarrierKind; 3] = [CarrierKind::Image, CarrierKind::Audio, CarrierKind::Video];

    /// File extensions accepted for this kind, lower case.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            CarrierKind::Image => &["png", "jpg", "jpeg", "bmp"],
            CarrierKind::Audio => &["wav"],
            CarrierKind::Video => &["y4m"],
        }
    }

    /// Guesses the kind from the extension of `path`.
    pub fn from_path(path: &Path) -> Option<CarrierKind> {
        Self::ALL.iter().copied().find(|kind| kind.accepts(path))
    }

    pub fn accepts(self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .extensions()
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    pub fn codec(self, policy: TerminatorPolicy) -> Box<dyn Codec> {
        match self {
            CarrierKind::Image => Box::new(ImageCodec::new(policy)),
            CarrierKind::Audio => Box::new(AudioCodec::new(policy)),
            CarrierKind::Video => Box::new(VideoCodec::new(policy)),
        }
    }
}

impl fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CarrierKind::Image => "image",
            CarrierKind::Audio => "audio",
            CarrierKind::Video => "video",
        };
        f.write_str(name)
    }
}

impl FromStr for CarrierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(CarrierKind::Image),
            "audio" => Ok(CarrierKind::Audio),
            "video" => Ok(CarrierKind::Video),
            other => Err(format!("unknown carrier kind: {}", other)),
        }
    }
}

/// `dir/encoded_<name>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("encoded_{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(Some(CarrierKind::Image), CarrierKind::from_path(Path::new("a/cat.JPG")));
        assert_eq!(Some(CarrierKind::Image), CarrierKind::from_path(Path::new("cat.bmp")));
        assert_eq!(Some(CarrierKind::Audio), CarrierKind::from_path(Path::new("song.wav")));
        assert_eq!(Some(CarrierKind::Video), CarrierKind::from_path(Path::new("clip.y4m")));
        assert_eq!(None, CarrierKind::from_path(Path::new("clip.mp4")));
        assert_eq!(None, CarrierKind::from_path(Path::new("README")));
    }

    #[test]
    fn test_accepts_only_own_extensions() {
        assert!(CarrierKind::Audio.accepts(Path::new("x.WAV")));
        assert!(!CarrierKind::Audio.accepts(Path::new("x.png")));
        assert!(!CarrierKind::Image.accepts(Path::new("x.y4m")));
    }

    #[test]
    fn test_parse_and_display() {
        for kind in CarrierKind::ALL.iter() {
            assert_eq!(*kind, kind.to_string().parse::<CarrierKind>().expect("no error"));
        }
        assert_eq!(Ok(CarrierKind::Video), "Video".parse::<CarrierKind>());
        assert!("gif".parse::<CarrierKind>().is_err());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            PathBuf::from("uploads/encoded_cover.png"),
            default_output_path(Path::new("uploads/cover.png"))
        );
        assert_eq!(
            PathBuf::from("encoded_song.wav"),
            default_output_path(Path::new("song.wav"))
        );
    }
}
