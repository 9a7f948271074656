//! Sample buffer and WAV codec
//!
//! Rendered audio is kept as `f32` samples; the codec reads and writes mono
//! 16-bit integer PCM only.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::Path;

const PCM_SCALE: f32 = 32767.0;

/// A sample outside [-1.0, 1.0] was handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeRangeError {
    pub index: usize,
    pub value: f32,
}

impl fmt::Display for EncodeRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sample {} is {} which is outside [-1, 1]; normalize before encoding",
            self.index, self.value
        )
    }
}

impl std::error::Error for EncodeRangeError {}

/// Codec errors
#[derive(Debug)]
pub enum CodecError {
    Range(EncodeRangeError),
    /// Only mono 16-bit integer PCM is supported
    UnsupportedFormat {
        channels: u16,
        bits_per_sample: u16,
    },
    Wav(hound::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Range(e) => write!(f, "{}", e),
            CodecError::UnsupportedFormat {
                channels,
                bits_per_sample,
            } => write!(
                f,
                "Unsupported WAV format: {} channel(s), {} bits per sample (expected mono 16-bit)",
                channels, bits_per_sample
            ),
            CodecError::Wav(e) => write!(f, "WAV error: {}", e),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Range(e) => Some(e),
            CodecError::Wav(e) => Some(e),
            CodecError::UnsupportedFormat { .. } => None,
        }
    }
}

impl From<EncodeRangeError> for CodecError {
    fn from(e: EncodeRangeError) -> Self {
        CodecError::Range(e)
    }
}

impl From<hound::Error> for CodecError {
    fn from(e: hound::Error) -> Self {
        CodecError::Wav(e)
    }
}

fn pcm16_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn write_pcm<W: Write + Seek>(mut wav: WavWriter<W>, pcm: &[i16]) -> Result<(), CodecError> {
    for &sample in pcm {
        wav.write_sample(sample)?;
    }
    wav.finalize()?;
    Ok(())
}

/// Encode one normalized sample as `round(value * 32767)`
pub fn encode_sample(value: f32) -> Option<i16> {
    if !(-1.0..=1.0).contains(&value) {
        return None;
    }
    Some((value * PCM_SCALE).round() as i16)
}

pub fn decode_sample(value: i16) -> f32 {
    value as f32 / PCM_SCALE
}

/// Mono audio samples at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_capacity(sample_rate, 0)
    }

    pub fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        Self {
            sample_rate,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn push(&mut self, sample: f32) {
        self.samples.push(sample);
    }

    pub fn extend_from_slice(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Largest absolute sample value, 0 for an empty buffer
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Multiply every sample by `gain`
    pub fn adjust(&mut self, gain: f32) {
        for sample in self.samples.iter_mut() {
            *sample *= gain;
        }
    }

    /// Scale so the peak absolute value is exactly 1.0
    ///
    /// Silent buffers are left untouched.
    pub fn normalize(&mut self) {
        let peak = self.peak();
        if peak == 0.0 {
            return;
        }
        // Dividing keeps the peak sample at exactly 1.0
        for sample in self.samples.iter_mut() {
            *sample /= peak;
        }
    }

    /// Convert to 16-bit PCM values
    pub fn to_pcm16(&self) -> Result<Vec<i16>, EncodeRangeError> {
        self.samples
            .iter()
            .enumerate()
            .map(|(index, &value)| encode_sample(value).ok_or(EncodeRangeError { index, value }))
            .collect()
    }

    /// Write as a mono 16-bit WAV stream
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), CodecError> {
        let pcm = self.to_pcm16()?;
        write_pcm(WavWriter::new(writer, pcm16_spec(self.sample_rate))?, &pcm)
    }

    /// Write a mono 16-bit WAV file
    ///
    /// Nothing is written if a sample is out of range.
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), CodecError> {
        let pcm = self.to_pcm16()?;
        write_pcm(WavWriter::create(path, pcm16_spec(self.sample_rate))?, &pcm)
    }

    /// Read a mono 16-bit WAV stream, one frame per sample
    pub fn read_from<R: Read>(reader: R) -> Result<Self, CodecError> {
        let wav = WavReader::new(reader)?;
        Self::decode(wav)
    }

    pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        let wav = WavReader::open(path)?;
        Self::decode(wav)
    }

    fn decode<R: Read>(mut wav: WavReader<R>) -> Result<Self, CodecError> {
        let spec = wav.spec();
        if spec.channels != 1
            || spec.bits_per_sample != 16
            || spec.sample_format != SampleFormat::Int
        {
            return Err(CodecError::UnsupportedFormat {
                channels: spec.channels,
                bits_per_sample: spec.bits_per_sample,
            });
        }

        let mut buffer = Self::with_capacity(spec.sample_rate, wav.len() as usize);
        for sample in wav.samples::<i16>() {
            buffer.push(decode_sample(sample?));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn buffer(samples: &[f32]) -> SampleBuffer {
        let mut b = SampleBuffer::new(16000);
        b.extend_from_slice(samples);
        b
    }

    #[test]
    fn test_normalize_to_unit_peak() {
        let mut b = buffer(&[0.1, -0.4, 0.2]);
        b.normalize();
        assert_eq!(b.peak(), 1.0);
        assert_eq!(b.samples()[1], -1.0);
        assert!((b.samples()[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_idempotent() {
        let mut b = buffer(&[0.3, -2.7, 1.9, 0.01]);
        b.normalize();
        let once = b.clone();
        b.normalize();
        assert_eq!(b, once);
    }

    #[test]
    fn test_normalize_silence_is_noop() {
        let mut b = buffer(&[0.0; 8]);
        b.normalize();
        b.normalize();
        assert!(b.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_adjust() {
        let mut b = buffer(&[1.0, -0.5]);
        b.adjust(0.9);
        assert_eq!(b.samples(), &[0.9, -0.45]);
    }

    #[test]
    fn test_encode_rounds() {
        assert_eq!(encode_sample(1.0), Some(32767));
        assert_eq!(encode_sample(-1.0), Some(-32767));
        assert_eq!(encode_sample(0.0), Some(0));
        // 0.5 * 32767 = 16383.5 rounds away from zero
        assert_eq!(encode_sample(0.5), Some(16384));
        assert_eq!(encode_sample(1.01), None);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let b = buffer(&[0.5, 1.5, -0.2]);
        assert_eq!(
            b.to_pcm16(),
            Err(EncodeRangeError {
                index: 1,
                value: 1.5
            })
        );

        let mut bytes = Cursor::new(Vec::new());
        assert!(matches!(b.write_to(&mut bytes), Err(CodecError::Range(_))));
    }

    #[test]
    fn test_stream_round_trip_reads_one_frame_per_sample() {
        let b = buffer(&[0.0, 0.25, -0.5, 1.0, -1.0]);
        let mut bytes = Cursor::new(Vec::new());
        b.write_to(&mut bytes).unwrap();

        let decoded = SampleBuffer::read_from(Cursor::new(bytes.into_inner())).unwrap();
        assert_eq!(decoded.sample_rate(), 16000);
        assert_eq!(decoded.len(), b.len());
        for (a, b) in decoded.samples().iter().zip(b.samples()) {
            assert!((a - b).abs() < 1.0 / PCM_SCALE);
        }
    }

    #[test]
    fn test_write_wav_header() {
        let path = std::env::temp_dir().join("tonesheet_test_header.wav");
        let num_samples = 1000;
        buffer(&vec![0.0; num_samples]).write_wav(&path).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(u16::from_le_bytes([data[20], data[21]]), 1); // PCM format
        assert_eq!(u16::from_le_bytes([data[22], data[23]]), 1); // Mono
        assert_eq!(
            u32::from_le_bytes([data[24], data[25], data[26], data[27]]),
            16000
        );
        assert_eq!(u16::from_le_bytes([data[34], data[35]]), 16);
        assert_eq!(data.len(), 44 + num_samples * 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_wav_skips_file_when_out_of_range() {
        let path = std::env::temp_dir().join("tonesheet_test_out_of_range.wav");
        let _ = fs::remove_file(&path);

        let result = buffer(&[0.5, -1.5]).write_wav(&path);
        assert!(matches!(
            result,
            Err(CodecError::Range(EncodeRangeError { index: 1, .. }))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_wav_matches_stream() {
        let b = buffer(&[0.0, 0.5, -0.25, 1.0]);
        let path = std::env::temp_dir().join("tonesheet_test_file_vs_stream.wav");
        b.write_wav(&path).unwrap();

        let mut bytes = Cursor::new(Vec::new());
        b.write_to(&mut bytes).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes.into_inner());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_rejects_stereo() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut bytes, spec).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.finalize().unwrap();
        }

        let result = SampleBuffer::read_from(Cursor::new(bytes.into_inner()));
        assert!(matches!(
            result,
            Err(CodecError::UnsupportedFormat { channels: 2, .. })
        ));
    }
}
