//! Upload client — posts a clip to the relay's `/predict-emotion` endpoint as
//! multipart form data.

use std::fmt;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::error::PredictionError;
use crate::pipeline::WavBlob;
use crate::prediction::{ErrorBody, Prediction, PredictorOutput, parse_predictor_output};
use crate::upload::{FIELD_NAME, MAX_UPLOAD_BYTES, mime_for_file_name};

#[derive(Debug)]
pub enum ClientError {
    UnsupportedFile(String),
    TooLarge { size: u64, limit: u64 },
    Io(std::io::Error),
    Http(reqwest::Error),
    Server { status: u16, message: String },
    InvalidResponse(PredictionError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::UnsupportedFile(name) => {
                write!(f, "'{name}' is not a WAV or MP3 file")
            }
            ClientError::TooLarge { size, limit } => {
                write!(f, "file is {size} bytes, limit is {limit}")
            }
            ClientError::Io(e) => write!(f, "I/O error: {e}"),
            ClientError::Http(e) => write!(f, "HTTP error: {e}"),
            ClientError::Server { status, message } => write!(f, "server returned {status}: {message}"),
            ClientError::InvalidResponse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

impl From<PredictionError> for ClientError {
    fn from(e: PredictionError) -> Self {
        ClientError::InvalidResponse(e)
    }
}

/// Client for one relay backend.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    base_url: String,
    http: reqwest::Client,
}

impl PredictionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/predict-emotion", self.base_url)
    }

    /// Upload a file from disk.
    pub async fn predict_file(&self, path: impl AsRef<Path>) -> Result<Prediction, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::UnsupportedFile(path.display().to_string()))?
            .to_string();
        // Check the name before reading a possibly large file.
        mime_for_file_name(&file_name).ok_or_else(|| ClientError::UnsupportedFile(file_name.clone()))?;

        let bytes = tokio::fs::read(path).await?;
        self.predict_bytes(&file_name, bytes).await
    }

    /// Upload a freshly encoded recording.
    pub async fn predict_wav(&self, blob: &WavBlob) -> Result<Prediction, ClientError> {
        self.predict_bytes("recording.wav", blob.bytes.clone()).await
    }

    pub async fn predict_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Prediction, ClientError> {
        let mime = mime_for_file_name(file_name)
            .ok_or_else(|| ClientError::UnsupportedFile(file_name.to_string()))?;
        let size = bytes.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(ClientError::TooLarge { size, limit: MAX_UPLOAD_BYTES });
        }

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part(FIELD_NAME, part);

        debug!(url = %self.endpoint(), file = file_name, size, "uploading clip");
        let response = self.http.post(self.endpoint()).multipart(form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(ClientError::Server { status: status.as_u16(), message });
        }

        match parse_predictor_output(&text)? {
            PredictorOutput::Prediction(prediction) => {
                info!(emotion = %prediction.emotion, "received prediction");
                Ok(prediction)
            }
            PredictorOutput::Failure(body) => Err(ClientError::Server {
                status: status.as_u16(),
                message: body.error,
            }),
        }
    }
}
