//! Audio decoding — compressed or containerised bytes to an [`AudioBuffer`].
//!
//! In the browser this is the platform's `decodeAudioData`; natively the
//! `native` feature provides hound (WAV) and minimp3 (MP3) decoders.

use super::AudioBuffer;
use crate::error::DecodeError;

/// Turns an encoded clip into a decoded buffer.
pub trait AudioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer, DecodeError>;
}

/// Container formats recognised by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// Identify a clip by its leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<AudioFormat> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return Some(AudioFormat::Wav);
    }
    if bytes.starts_with(b"ID3") {
        return Some(AudioFormat::Mp3);
    }
    // MPEG audio frame sync: 11 set bits
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 {
        return Some(AudioFormat::Mp3);
    }
    None
}

type BoxedDecoder = Box<dyn AudioDecoder + Send + Sync>;

/// Dispatches to a per-format decoder chosen by [`sniff`].
#[derive(Default)]
pub struct SniffingDecoder {
    wav: Option<BoxedDecoder>,
    mp3: Option<BoxedDecoder>,
}

impl SniffingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wav(mut self, decoder: impl AudioDecoder + Send + Sync + 'static) -> Self {
        self.wav = Some(Box::new(decoder));
        self
    }

    pub fn with_mp3(mut self, decoder: impl AudioDecoder + Send + Sync + 'static) -> Self {
        self.mp3 = Some(Box::new(decoder));
        self
    }

    /// WAV and MP3 support backed by hound and minimp3.
    #[cfg(feature = "native")]
    pub fn native() -> Self {
        Self::new().with_wav(WavDecoder).with_mp3(Mp3Decoder)
    }
}

impl AudioDecoder for SniffingDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let format = sniff(bytes)
            .ok_or_else(|| DecodeError::UnsupportedFormat("unrecognised header".into()))?;
        let decoder = match format {
            AudioFormat::Wav => self.wav.as_ref(),
            AudioFormat::Mp3 => self.mp3.as_ref(),
        };
        match decoder {
            Some(d) => d.decode(bytes),
            None => Err(DecodeError::UnsupportedFormat(format!(
                "no {} decoder installed",
                format.extension()
            ))),
        }
    }
}

/// RIFF/WAVE decoder (integer PCM up to 32 bits, or 32-bit float).
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

#[cfg(feature = "native")]
impl AudioDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
        let mut reader = hound::WavReader::new(std::io::Cursor::new(bytes))
            .map_err(|e| DecodeError::Malformed(format!("WAV header: {e}")))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Malformed(format!("WAV samples: {e}")))?,
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(DecodeError::UnsupportedFormat(format!(
                        "{}-bit integer WAV",
                        spec.bits_per_sample
                    )));
                }
                let full_scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| DecodeError::Malformed(format!("WAV samples: {e}")))?
            }
        };

        AudioBuffer::from_interleaved(&interleaved, spec.channels as usize, spec.sample_rate)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

/// MPEG layer III decoder.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3Decoder;

#[cfg(feature = "native")]
impl AudioDecoder for Mp3Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer, DecodeError> {
        let mut decoder = minimp3::Decoder::new(std::io::Cursor::new(bytes));
        let mut interleaved: Vec<f32> = Vec::new();
        let mut layout: Option<(usize, u32)> = None;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    if frame.channels == 0 || frame.sample_rate <= 0 {
                        continue;
                    }
                    let this = (frame.channels, frame.sample_rate as u32);
                    match layout {
                        None => layout = Some(this),
                        Some(first) if first != this => {
                            return Err(DecodeError::Malformed(format!(
                                "stream changes from {}ch/{}Hz to {}ch/{}Hz",
                                first.0, first.1, this.0, this.1
                            )));
                        }
                        Some(_) => {}
                    }
                    interleaved.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
                }
                Err(minimp3::Error::SkippedData) => continue,
                Err(minimp3::Error::Eof) | Err(minimp3::Error::InsufficientData) => break,
                Err(minimp3::Error::Io(e)) => {
                    return Err(DecodeError::Malformed(format!("MP3 read: {e}")));
                }
            }
        }

        let (channels, sample_rate) =
            layout.ok_or_else(|| DecodeError::Malformed("no MPEG audio frames found".into()))?;
        AudioBuffer::from_interleaved(&interleaved, channels, sample_rate)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}
