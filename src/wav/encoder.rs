//! WAV encoder — turns a decoded [`AudioBuffer`] into a canonical
//! 16-bit PCM RIFF/WAVE byte buffer.
//!
//! Layout is the classic 44-byte header (`RIFF`, one 16-byte `fmt ` chunk,
//! `data`) followed by frame-major interleaved `i16` samples.

use super::writer::ByteWriter;
use crate::audio::AudioBuffer;

/// Size of the RIFF + fmt + data headers.
pub const HEADER_LEN: usize = 44;

const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Total encoded size for `num_channels` × `num_frames` samples.
pub fn encoded_len(num_channels: usize, num_frames: usize) -> usize {
    HEADER_LEN + num_channels * num_frames * BYTES_PER_SAMPLE
}

/// Convert one float sample to 16-bit PCM.
///
/// Clamped to [-1, 1]; negatives scale by 32768 and the rest by 32767, so
/// -1.0 maps to `i16::MIN` and 1.0 to `i16::MAX` without wrapping. NaN
/// becomes 0.
///
/// Scaling happens in `f64`, where the product of an `f32` and 32767 is
/// exact, so values just below a half step never round up.
pub fn sample_to_pcm16(sample: f32) -> i16 {
    let s = f64::from(sample).clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

/// Encode every channel of `buffer` as interleaved 16-bit PCM WAV bytes.
pub fn encode_wav(buffer: &AudioBuffer) -> Vec<u8> {
    let channels = buffer.number_of_channels();
    let frames = buffer.length();
    let length = encoded_len(channels, frames);

    // AudioBuffer guarantees these fit their header fields.
    let num_channels = channels as u16;
    let sample_rate = buffer.sample_rate();
    let block_align = num_channels * BYTES_PER_SAMPLE as u16;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (length - HEADER_LEN) as u32;

    let mut w = ByteWriter::with_len(length);

    // RIFF header
    w.write_tag(b"RIFF");
    w.write_u32_le((length - 8) as u32);
    w.write_tag(b"WAVE");

    // fmt chunk
    w.write_tag(b"fmt ");
    w.write_u32_le(FMT_CHUNK_LEN);
    w.write_u16_le(FORMAT_PCM);
    w.write_u16_le(num_channels);
    w.write_u32_le(sample_rate);
    w.write_u32_le(byte_rate);
    w.write_u16_le(block_align);
    w.write_u16_le(BITS_PER_SAMPLE);

    // data chunk
    w.write_tag(b"data");
    w.write_u32_le(data_len);
    let planes = buffer.channels();
    for frame in 0..frames {
        for plane in planes {
            w.write_i16_le(sample_to_pcm16(plane[frame]));
        }
    }

    debug_assert_eq!(w.remaining(), 0);
    w.into_inner()
}
