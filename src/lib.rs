pub mod audio;
pub mod error;
pub mod pipeline;
pub mod prediction;
pub mod upload;
pub mod wav;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "relay")]
pub mod relay;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::AudioBuffer;
use crate::prediction::{PredictorOutput, RankedLabel};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: encode planar f32 samples (channel 0, then channel 1, …,
/// as concatenated `getChannelData` arrays) to a 16-bit PCM WAV byte array.
#[wasm_bindgen]
pub fn encode_wav(samples: &[f32], num_channels: u32, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let buffer = AudioBuffer::from_planar(samples, num_channels as usize, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(wav::encode_wav(&buffer))
}

/// WASM-exposed: encode a single channel of f32 samples to WAV bytes.
#[wasm_bindgen]
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    encode_wav(samples, 1, sample_rate)
}

/// WASM-exposed: down-mix planar samples to one channel using the Web Audio
/// speaker rules.
#[wasm_bindgen]
pub fn mixdown_to_mono(samples: &[f32], num_channels: u32) -> Result<Vec<f32>, JsValue> {
    // Sample rate is irrelevant to the mix; any non-zero value validates.
    let buffer = AudioBuffer::from_planar(samples, num_channels as usize, 1)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(audio::render::mixdown_to_mono(buffer.channels()))
}

/// What the results panel renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictionView {
    emotion: String,
    ranked: Vec<RankedLabel>,
    mel_spectrogram_url: String,
    polar_plot_url: String,
}

/// WASM-exposed: parse a `/predict-emotion` response body into the shape
/// the results panel renders. A predictor error is thrown as its message.
#[wasm_bindgen]
pub fn parse_prediction(json: &str) -> Result<JsValue, JsValue> {
    let output =
        prediction::parse_predictor_output(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let prediction = match output {
        PredictorOutput::Prediction(p) => p,
        PredictorOutput::Failure(body) => return Err(JsValue::from_str(&body.error)),
    };
    let view = PredictionView {
        emotion: prediction.emotion.clone(),
        ranked: prediction.ranked(),
        mel_spectrogram_url: prediction.mel_spectrogram_data_url(),
        polar_plot_url: prediction.polar_plot_data_url(),
    };
    serde_wasm_bindgen::to_value(&view).map_err(|e| JsValue::from_str(&format!("{e}")))
}
