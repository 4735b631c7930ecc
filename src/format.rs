//! Output container formats and encoder bitrates.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::batch::ValidationError;

/// Audio formats the amplifier can select files by and re-encode into.
///
/// The format doubles as the file extension filter: a job for
/// [`AudioFormat::Mp3`] only picks up `*.mp3` files and writes `*.mp3` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum AudioFormat {
    /// MPEG-1 Layer III
    #[default]
    Mp3,
    /// Ogg container (Vorbis)
    Ogg,
    /// MPEG-4 audio (AAC)
    M4a,
    /// RIFF WAVE (PCM)
    Wav,
}

impl AudioFormat {
    /// Every supported format, in the order offered to users.
    pub const ALL: [AudioFormat; 4] = [Self::Mp3, Self::Ogg, Self::M4a, Self::Wav];

    /// Extension without the leading dot, as handed to the codec.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::M4a => "m4a",
            Self::Wav => "wav",
        }
    }

    /// Extension with the leading dot, as used for suffix matching.
    pub const fn dotted(&self) -> &'static str {
        match self {
            Self::Mp3 => ".mp3",
            Self::Ogg => ".ogg",
            Self::M4a => ".m4a",
            Self::Wav => ".wav",
        }
    }

    /// Returns true if `file_name` ends with this format's extension,
    /// ignoring ASCII case.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let suffix = self.dotted();
        file_name.len() > suffix.len()
            && file_name
                .get(file_name.len() - suffix.len()..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
    }

    /// Whether the encoder for this format honours a target bitrate.
    ///
    /// WAV is uncompressed PCM, so the requested bitrate is ignored.
    pub const fn is_lossy(&self) -> bool {
        !matches!(self, Self::Wav)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dotted())
    }
}

impl FromStr for AudioFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.strip_prefix('.').unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(bare))
            .ok_or_else(|| ValidationError::UnsupportedExtension(s.to_string()))
    }
}

impl TryFrom<String> for AudioFormat {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Encoder bitrate in the `<digits>[k|m]` notation, e.g. `"192k"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Bitrate {
    bits_per_second: u64,
    spelled: String,
}

impl Bitrate {
    /// Parse a bitrate such as `"192k"`, `"1M"` or `"320000"`.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidBitrate`] for empty, zero, overflowing
    /// or otherwise malformed values.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidBitrate(value.to_string());
        let spelled = value.trim().to_ascii_lowercase();

        let (digits, multiplier) = match spelled.strip_suffix('k') {
            Some(digits) => (digits, 1_000u64),
            None => match spelled.strip_suffix('m') {
                Some(digits) => (digits, 1_000_000u64),
                None => (spelled.as_str(), 1u64),
            },
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let bits_per_second = digits
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .filter(|&bps| bps > 0)
            .ok_or_else(invalid)?;

        Ok(Self {
            bits_per_second,
            spelled,
        })
    }

    /// Bitrate in bits per second.
    pub const fn bits_per_second(&self) -> u64 {
        self.bits_per_second
    }

    /// The value passed to `ffmpeg -b:a`.
    pub fn as_ffmpeg_arg(&self) -> &str {
        &self.spelled
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self {
            bits_per_second: 192_000,
            spelled: "192k".to_string(),
        }
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelled)
    }
}

impl FromStr for Bitrate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bitrate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(".mp3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("OGG".parse::<AudioFormat>().unwrap(), AudioFormat::Ogg);
        assert_eq!(" .M4A ".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);
        assert_eq!("wav".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);

        let err = ".flac".parse::<AudioFormat>().unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedExtension(ref ext) if ext == ".flac"));
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let mp3 = AudioFormat::Mp3;
        assert!(mp3.matches_file_name("song.mp3"));
        assert!(mp3.matches_file_name("SONG.MP3"));
        assert!(mp3.matches_file_name("live.set.Mp3"));
        assert!(!mp3.matches_file_name("song.mp3.bak"));
        assert!(!mp3.matches_file_name("song.wav"));
        // a bare extension is not a file with that extension
        assert!(!mp3.matches_file_name(".mp3"));
    }

    #[test]
    fn test_bitrate_parsing() {
        let b = Bitrate::parse("192k").unwrap();
        assert_eq!(b.bits_per_second(), 192_000);
        assert_eq!(b.as_ffmpeg_arg(), "192k");

        let b = Bitrate::parse(" 1M ").unwrap();
        assert_eq!(b.bits_per_second(), 1_000_000);
        assert_eq!(b.to_string(), "1m");

        assert_eq!(Bitrate::parse("320000").unwrap().bits_per_second(), 320_000);
        assert_eq!(Bitrate::default().bits_per_second(), 192_000);
    }

    #[test]
    fn test_bitrate_rejects_garbage() {
        for bad in ["", "k", "0k", "-192k", "192kb", "12.5k", "99999999999999999999k"] {
            assert!(
                matches!(Bitrate::parse(bad), Err(ValidationError::InvalidBitrate(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
