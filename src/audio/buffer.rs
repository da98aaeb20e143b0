//! Decoded audio buffer — per-channel f32 samples at a single sample rate.

use crate::error::BufferError;
use crate::wav::encoder::encoded_len;

/// An uncompressed clip held as separate channels of equal length.
///
/// Every constructor validates the shape, so an `AudioBuffer` always has at
/// least one channel, a non-zero sample rate, equal channel lengths, and a
/// size that fits the WAV header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build from planar channel vectors.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, BufferError> {
        if channels.is_empty() {
            return Err(BufferError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        check_channel_count(channels.len())?;

        let expected = channels[0].len();
        if let Some((channel, found)) = channels
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(BufferError::ChannelLengthMismatch { channel, expected, found });
        }

        let bytes = encoded_len(channels.len(), expected);
        if bytes > u32::MAX as usize {
            return Err(BufferError::TooLong { bytes });
        }
        if sample_rate as u64 * channels.len() as u64 * 2 > u32::MAX as u64 {
            return Err(BufferError::ByteRateOverflow {
                sample_rate,
                channels: channels.len(),
            });
        }

        Ok(AudioBuffer { channels, sample_rate })
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, BufferError> {
        Self::new(vec![samples], sample_rate)
    }

    /// De-interleave frame-major samples (`L R L R …`) into channels.
    pub fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if num_channels == 0 {
            return Err(BufferError::NoChannels);
        }
        check_channel_count(num_channels)?;
        if samples.len() % num_channels != 0 {
            return Err(BufferError::RaggedInterleaved {
                samples: samples.len(),
                channels: num_channels,
            });
        }

        let frames = samples.len() / num_channels;
        let mut channels: Vec<Vec<f32>> =
            (0..num_channels).map(|_| Vec::with_capacity(frames)).collect();
        for frame in samples.chunks_exact(num_channels) {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Split channel-after-channel samples (`L L L … R R R …`) into channels.
    ///
    /// This is the layout a browser produces by concatenating the
    /// `getChannelData` arrays of an `AudioBuffer`.
    pub fn from_planar(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if num_channels == 0 {
            return Err(BufferError::NoChannels);
        }
        check_channel_count(num_channels)?;
        if samples.len() % num_channels != 0 {
            return Err(BufferError::RaggedInterleaved {
                samples: samples.len(),
                channels: num_channels,
            });
        }

        let frames = samples.len() / num_channels;
        let channels = if frames == 0 {
            vec![Vec::new(); num_channels]
        } else {
            samples.chunks_exact(frames).map(<[f32]>::to_vec).collect()
        };
        Self::new(channels, sample_rate)
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames per channel.
    pub fn length(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Samples of one channel, or `None` past the last channel.
    pub fn channel_data(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.length() as f64 / self.sample_rate as f64
    }

    /// Frame-major interleaved copy of all channels.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.length() * self.number_of_channels());
        for frame in 0..self.length() {
            for ch in &self.channels {
                out.push(ch[frame]);
            }
        }
        out
    }

}

/// Block align (channels * 2) is a u16 header field. Checked before any
/// per-channel allocation.
fn check_channel_count(count: usize) -> Result<(), BufferError> {
    if count > (u16::MAX / 2) as usize {
        return Err(BufferError::TooManyChannels { count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_channel_list() {
        assert_eq!(AudioBuffer::new(vec![], 44100), Err(BufferError::NoChannels));
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert_eq!(
            AudioBuffer::mono(vec![0.0], 0),
            Err(BufferError::ZeroSampleRate)
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 8000).unwrap_err();
        assert_eq!(
            err,
            BufferError::ChannelLengthMismatch { channel: 1, expected: 4, found: 3 }
        );
    }

    #[test]
    fn rejects_byte_rate_overflow() {
        let err = AudioBuffer::new(vec![vec![]; 2], u32::MAX / 2).unwrap_err();
        assert!(matches!(err, BufferError::ByteRateOverflow { .. }));
    }

    #[test]
    fn interleaved_round_trip() {
        let samples = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buf = AudioBuffer::from_interleaved(&samples, 2, 48000).unwrap();
        assert_eq!(buf.number_of_channels(), 2);
        assert_eq!(buf.length(), 3);
        assert_eq!(buf.channel_data(0).unwrap(), &[0.1f32, 0.2, 0.3]);
        assert_eq!(buf.channel_data(1).unwrap(), &[-0.1f32, -0.2, -0.3]);
        assert_eq!(buf.interleaved(), samples.to_vec());
    }

    #[test]
    fn planar_split() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let buf = AudioBuffer::from_planar(&samples, 3, 8000).unwrap();
        assert_eq!(buf.channel_data(2).unwrap(), &[5.0f32, 6.0]);
        assert!(buf.channel_data(3).is_none());
    }

    #[test]
    fn planar_allows_zero_frames() {
        let buf = AudioBuffer::from_planar(&[], 2, 8000).unwrap();
        assert_eq!(buf.number_of_channels(), 2);
        assert!(buf.is_empty());
    }

    #[test]
    fn huge_channel_count_rejected_before_allocating() {
        let count = 4_000_000_000usize;
        assert_eq!(
            AudioBuffer::from_planar(&[], count, 44100),
            Err(BufferError::TooManyChannels { count })
        );
        assert_eq!(
            AudioBuffer::from_interleaved(&[], count, 44100),
            Err(BufferError::TooManyChannels { count })
        );
    }

    #[test]
    fn ragged_input_rejected() {
        assert!(matches!(
            AudioBuffer::from_interleaved(&[0.0; 5], 2, 8000),
            Err(BufferError::RaggedInterleaved { samples: 5, channels: 2 })
        ));
    }

    #[test]
    fn duration_in_seconds() {
        let buf = AudioBuffer::mono(vec![0.0; 22050], 44100).unwrap();
        assert!((buf.duration() - 0.5).abs() < 1e-12);
    }
}
