//! Prediction model — the JSON document the emotion predictor prints and
//! the relay forwards to the browser.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

/// A successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Winning label (e.g. "happy").
    pub emotion: String,
    /// Label → probability in percent (0–100).
    pub probabilities: BTreeMap<String, f64>,
    /// Mel spectrogram, base64-encoded PNG.
    pub mel_spectrogram_base64: String,
    /// Polar plot of the probabilities, base64-encoded PNG.
    pub polar_plot_base64: String,
}

/// `{"error": "..."}` — shape of every failure body, from the predictor or
/// the relay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody { error: message.into() }
    }
}

/// What the predictor printed: a prediction, or its own error report.
///
/// An object with `error` and no `emotion` is a failure; anything else has
/// to be a complete prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictorOutput {
    Prediction(Prediction),
    Failure(ErrorBody),
}

impl<'de> Deserialize<'de> for PredictorOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("error").is_some() && value.get("emotion").is_none() {
            ErrorBody::deserialize(value)
                .map(PredictorOutput::Failure)
                .map_err(de::Error::custom)
        } else {
            Prediction::deserialize(value)
                .map(PredictorOutput::Prediction)
                .map_err(de::Error::custom)
        }
    }
}

/// One bar of the probability chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
    pub label: String,
    pub percent: f64,
}

/// Parse the predictor's stdout. Surrounding whitespace is ignored.
pub fn parse_predictor_output(stdout: &str) -> Result<PredictorOutput, PredictionError> {
    Ok(serde_json::from_str(stdout.trim())?)
}

impl Prediction {
    /// Labels sorted by descending probability, ties broken by label.
    pub fn ranked(&self) -> Vec<RankedLabel> {
        let mut ranked: Vec<RankedLabel> = self
            .probabilities
            .iter()
            .map(|(label, &percent)| RankedLabel { label: label.clone(), percent })
            .collect();
        ranked.sort_by(|a, b| {
            b.percent
                .total_cmp(&a.percent)
                .then_with(|| a.label.cmp(&b.label))
        });
        ranked
    }

    /// Probability of the reported emotion, if the map contains it.
    pub fn top_probability(&self) -> Option<f64> {
        self.probabilities.get(&self.emotion).copied()
    }

    pub fn mel_spectrogram_data_url(&self) -> String {
        png_data_url(&self.mel_spectrogram_base64)
    }

    pub fn polar_plot_data_url(&self) -> String {
        png_data_url(&self.polar_plot_base64)
    }

    /// Raw PNG bytes of the mel spectrogram.
    pub fn decode_mel_spectrogram(&self) -> Result<Vec<u8>, PredictionError> {
        Ok(STANDARD.decode(self.mel_spectrogram_base64.trim())?)
    }

    /// Raw PNG bytes of the polar plot.
    pub fn decode_polar_plot(&self) -> Result<Vec<u8>, PredictionError> {
        Ok(STANDARD.decode(self.polar_plot_base64.trim())?)
    }
}

fn png_data_url(base64: &str) -> String {
    format!("data:image/png;base64,{base64}")
}
