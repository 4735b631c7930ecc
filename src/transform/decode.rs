use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{trace, warn};

use super::{DecodedAudio, TransformError, TransformResult};
use crate::format::AudioFormat;

const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Decode an entire file into memory.
///
/// The format is used as a probe hint only; the container is detected from
/// the file contents. Packets that fail to decode are skipped with a warning,
/// any other decoder error fails the file.
///
/// # Errors
/// [`TransformError::Io`] if the file cannot be opened,
/// [`TransformError::NoAudioTrack`] if nothing decodable is found and
/// [`TransformError::Decode`] for malformed streams.
pub fn decode_file(path: &Path, format: AudioFormat) -> TransformResult<DecodedAudio> {
    let file = File::open(path).map_err(|e| TransformError::io(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TransformError::decode(path, e))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TransformError::NoAudioTrack {
            path: path.to_path_buf(),
        })?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let bits_per_sample = track
        .codec_params
        .bits_per_sample
        .and_then(|b| u16::try_from(b).ok())
        .unwrap_or(DEFAULT_BITS_PER_SAMPLE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TransformError::decode(path, e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(TransformError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count());

                let needed = decoded.capacity() * spec.channels.count();
                if buffer.as_ref().is_none_or(|b| b.capacity() < needed) {
                    buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                let Some(buf) = buffer.as_mut() else { continue };
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(file = %path.display(), %msg, "skipping undecodable packet");
            }
            Err(e) => return Err(TransformError::decode(path, e)),
        }
    }

    let (Some(channels), Some(sample_rate)) = (channels, sample_rate) else {
        return Err(TransformError::NoAudioTrack {
            path: path.to_path_buf(),
        });
    };

    trace!(
        file = %path.display(),
        channels,
        sample_rate,
        samples = interleaved.len(),
        "decoded"
    );

    Ok(DecodedAudio::from_interleaved(
        &interleaved,
        channels,
        sample_rate,
        bits_per_sample,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::native::tests::write_test_wav;

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, &[0.5, -0.5, 0.25, -0.25, 0.0, 0.0], 2);

        let audio = decode_file(&path, AudioFormat::Wav).unwrap();
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.frames(), 3);
        assert_eq!(audio.sample_rate(), 44100);
        assert_eq!(audio.bits_per_sample(), 16);
        assert!((audio.samples()[[0, 0]] - 0.5).abs() < 1e-3);
        assert!((audio.samples()[[1, 1]] + 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();

        let err = decode_file(&path, AudioFormat::Mp3).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Decode { .. } | TransformError::NoAudioTrack { .. }
        ));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/no/such/file.wav"), AudioFormat::Wav).unwrap_err();
        assert!(matches!(err, TransformError::Io { .. }));
    }
}
