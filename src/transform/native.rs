use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use super::{
    AudioTransform, DecodedAudio, TransformError, TransformParams, TransformResult, decode_file,
};
use crate::format::AudioFormat;

/// In-process backend: `symphonia` decode, gain, `hound` WAV encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransform;

impl AudioTransform for NativeTransform {
    fn transform(
        &self,
        input: &Path,
        output: &Path,
        params: &TransformParams,
    ) -> TransformResult<u64> {
        if params.format != AudioFormat::Wav {
            return Err(TransformError::UnsupportedFormat {
                backend: self.name(),
                format: params.format,
            });
        }

        let audio = decode_file(input, params.format)?.apply_gain(params.gain_db);
        debug!(
            file = %input.display(),
            gain_db = params.gain_db,
            peak = audio.peak(),
            "gain applied"
        );
        export_wav(&audio, output)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

/// Write `audio` as integer PCM WAV, keeping 16-bit sources at 16 bits and
/// writing anything wider as 24 bits.
///
/// A partially written file is removed on failure.
///
/// # Returns
/// Size of the written file in bytes.
pub fn export_wav(audio: &DecodedAudio, output: &Path) -> TransformResult<u64> {
    match write_wav(audio, output) {
        Ok(()) => fs::metadata(output)
            .map(|m| m.len())
            .map_err(|e| TransformError::io(output, e)),
        Err(err) => {
            let _ = fs::remove_file(output);
            Err(err)
        }
    }
}

fn write_wav(audio: &DecodedAudio, output: &Path) -> TransformResult<()> {
    let channels =
        u16::try_from(audio.channels()).map_err(|_| TransformError::encode(output, "too many channels"))?;
    let bits_per_sample: u16 = if audio.bits_per_sample() <= 16 { 16 } else { 24 };
    let spec = WavSpec {
        channels,
        sample_rate: audio.sample_rate(),
        bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(output, spec).map_err(|e| wav_error(output, e))?;
    if bits_per_sample == 16 {
        for sample in audio.interleaved() {
            let value = (sample * f32::from(i16::MAX)).round() as i16;
            writer.write_sample(value).map_err(|e| wav_error(output, e))?;
        }
    } else {
        const MAX_24: f32 = 8_388_607.0;
        for sample in audio.interleaved() {
            let value = (sample * MAX_24).round() as i32;
            writer.write_sample(value).map_err(|e| wav_error(output, e))?;
        }
    }
    writer.finalize().map_err(|e| wav_error(output, e))
}

fn wav_error(output: &Path, err: hound::Error) -> TransformError {
    match err {
        hound::Error::IoError(e) => TransformError::io(output, e),
        other => TransformError::encode(output, other),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::format::Bitrate;

    /// Write a 16-bit 44.1 kHz WAV from interleaved normalized samples.
    pub(crate) fn write_test_wav(path: &Path, interleaved: &[f32], channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in interleaved {
            writer.write_sample((s * 32767.0).round() as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_samples(path: &Path) -> Vec<i16> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    fn wav_params(gain_db: f64) -> TransformParams {
        TransformParams {
            gain_db,
            bitrate: Bitrate::default(),
            format: AudioFormat::Wav,
        }
    }

    #[test]
    fn test_native_gain_doubles_amplitude() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_test_wav(&input, &[0.25, -0.25, 0.1, 0.0], 2);

        let written = NativeTransform
            .transform(&input, &output, &wav_params(6.0206))
            .unwrap();
        assert_eq!(written, fs::metadata(&output).unwrap().len());

        let before = read_samples(&input);
        let after = read_samples(&output);
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert!((i32::from(*a) - 2 * i32::from(*b)).abs() <= 2, "{b} -> {a}");
        }

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
    }

    #[test]
    fn test_native_clips_at_full_scale() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loud.wav");
        let output = dir.path().join("louder.wav");
        write_test_wav(&input, &[0.9, -0.9], 1);

        NativeTransform
            .transform(&input, &output, &wav_params(20.0))
            .unwrap();
        assert_eq!(read_samples(&output), vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_native_rejects_lossy_output() {
        let dir = tempfile::tempdir().unwrap();
        let params = TransformParams {
            format: AudioFormat::Ogg,
            ..wav_params(3.0)
        };
        let err = NativeTransform
            .transform(&dir.path().join("a.ogg"), &dir.path().join("b.ogg"), &params)
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnsupportedFormat {
                backend: "native",
                format: AudioFormat::Ogg
            }
        ));
    }

    #[test]
    fn test_corrupt_input_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.wav");
        let output = dir.path().join("out").join("broken.wav");
        fs::write(&input, b"RIFF....WAVEjunk").unwrap();
        fs::create_dir_all(output.parent().unwrap()).unwrap();

        assert!(NativeTransform
            .transform(&input, &output, &wav_params(6.0))
            .is_err());
        assert!(!output.exists());
    }
}
