//! WAV container I/O utilities.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{self, Cursor, Read};
use std::path::Path;
use tts_core::{SynthesisResult, TtsError, TtsResult};

/// MIME type of encoded responses.
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Default fade duration in milliseconds at segment edges.
pub const DEFAULT_FADE_MS: f32 = 5.0;

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Encode audio into an in-memory 16-bit PCM mono WAV buffer.
pub fn encode_wav(audio: &SynthesisResult) -> TtsResult<Vec<u8>> {
    if audio.sample_rate == 0 {
        return Err(TtsError::encode("sample rate must be non-zero"));
    }

    let mut buffer = Vec::with_capacity(44 + audio.samples.len() * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buffer), pcm16_spec(audio.sample_rate))
            .map_err(|e| TtsError::encode(e.to_string()))?;

        let mut samples = writer.get_i16_writer(audio.samples.len() as u32);
        for &sample in &audio.samples {
            samples.write_sample(to_i16(sample));
        }
        samples
            .flush()
            .map_err(|e| TtsError::encode(e.to_string()))?;

        writer
            .finalize()
            .map_err(|e| TtsError::encode(e.to_string()))?;
    }

    Ok(buffer)
}

/// Write audio to a WAV file.
pub fn write_wav(path: impl AsRef<Path>, audio: &SynthesisResult) -> TtsResult<()> {
    let bytes = encode_wav(audio)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Decode a WAV buffer into mono f32 samples.
///
/// Multi-channel input is averaged down to one channel.
pub fn decode_wav(bytes: &[u8]) -> TtsResult<SynthesisResult> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(invalid_data)?;
    collect_mono(reader)
}

/// Read a WAV file into mono f32 samples.
pub fn read_wav(path: impl AsRef<Path>) -> TtsResult<SynthesisResult> {
    let reader = WavReader::open(path.as_ref()).map_err(invalid_data)?;
    collect_mono(reader)
}

fn collect_mono<R: Read>(reader: WavReader<R>) -> TtsResult<SynthesisResult> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(invalid_data)?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(invalid_data)?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(SynthesisResult::new(samples, spec.sample_rate))
}

fn invalid_data(e: hound::Error) -> TtsError {
    TtsError::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Root mean square level of `samples`.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Apply a Hann fade-in to the start of `samples`.
pub fn apply_fade_in(samples: &mut [f32], fade_ms: f32, sample_rate: u32) {
    let fade_samples = ((fade_ms / 1000.0) * sample_rate as f32) as usize;
    let fade_samples = fade_samples.min(samples.len());

    for (i, sample) in samples.iter_mut().take(fade_samples).enumerate() {
        let t = i as f32 / fade_samples.max(1) as f32;
        *sample *= 0.5 * (1.0 - (std::f32::consts::PI * t).cos());
    }
}

/// Apply a Hann fade-out to the end of `samples`.
pub fn apply_fade_out(samples: &mut [f32], fade_ms: f32, sample_rate: u32) {
    let fade_samples = ((fade_ms / 1000.0) * sample_rate as f32) as usize;
    let fade_samples = fade_samples.min(samples.len());
    let start = samples.len() - fade_samples;

    for (i, sample) in samples[start..].iter_mut().enumerate() {
        let t = i as f32 / fade_samples.max(1) as f32;
        *sample *= 0.5 * (1.0 + (std::f32::consts::PI * t).cos());
    }
}
