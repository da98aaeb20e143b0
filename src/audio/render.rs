//! Offline rendering — mixes a decoded clip down to a deterministic buffer
//! before encoding.

use super::AudioBuffer;
use crate::error::AudioError;

/// Renders a decoded buffer into the buffer that will actually be encoded.
pub trait AudioRenderer {
    fn render(&self, input: AudioBuffer) -> Result<AudioBuffer, AudioError>;
}

/// Offline render into a single channel at the input's length and rate.
///
/// Channel gains follow the Web Audio "speakers" down-mix rules, so a
/// native render matches what a one-channel `OfflineAudioContext` produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoMixdown;

impl AudioRenderer for MonoMixdown {
    fn render(&self, input: AudioBuffer) -> Result<AudioBuffer, AudioError> {
        let sample_rate = input.sample_rate();
        if input.number_of_channels() == 1 {
            return Ok(input);
        }
        let mixed = mixdown_to_mono(input.channels());
        Ok(AudioBuffer::mono(mixed, sample_rate)?)
    }
}

/// Per-channel gains for a mono down-mix of `count` channels.
///
/// Counts other than 1, 2, 4 and 6 use the discrete rule: keep channel 0.
pub fn mono_gains(count: usize) -> Vec<f32> {
    const SQRT_HALF: f32 = std::f32::consts::FRAC_1_SQRT_2;
    match count {
        1 => vec![1.0],
        2 => vec![0.5, 0.5],
        4 => vec![0.25; 4],
        // L R C LFE SL SR
        6 => vec![SQRT_HALF, SQRT_HALF, 1.0, 0.0, 0.5, 0.5],
        _ => {
            let mut gains = vec![0.0; count];
            if let Some(first) = gains.first_mut() {
                *first = 1.0;
            }
            gains
        }
    }
}

/// Sum equal-length channels into one using [`mono_gains`].
pub fn mixdown_to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    let gains = mono_gains(channels.len());
    let len = channels.first().map_or(0, Vec::len);
    let mut out = vec![0.0f32; len];
    for (plane, &gain) in channels.iter().zip(&gains) {
        if gain == 0.0 {
            continue;
        }
        for (acc, &s) in out.iter_mut().zip(plane) {
            *acc += s * gain;
        }
    }
    out
}
