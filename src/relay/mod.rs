//! Prediction relay — the backend half of `/predict-emotion`.
//!
//! An upload is written to a temporary file, the external predictor is run
//! on it, and the predictor's exit status and stdout are mapped to a status
//! code and JSON body. Routing and CORS belong to whatever server embeds
//! [`RelayService`].

pub mod config;
pub mod predictor;
pub mod service;

pub use config::{PredictorConfig, RelayConfig};
pub use predictor::{Predictor, PredictorRun, ScriptPredictor};
pub use service::{RelayResponse, RelayService, Upload};
