//! Upload handling: store the clip, run the predictor, map the outcome to a
//! status code and JSON body.

use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use super::config::RelayConfig;
use super::predictor::Predictor;
use crate::error::RelayError;
use crate::prediction::{ErrorBody, PredictorOutput, parse_predictor_output};

pub const MSG_NO_FILE: &str = "No file uploaded.";
pub const MSG_TOO_LARGE: &str = "File too large.";
pub const MSG_PREDICT_FAILED: &str = "Failed to predict emotion.";
pub const MSG_INVALID_RESPONSE: &str = "Invalid prediction response.";

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Status code plus JSON body, ready for whatever transport carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

impl RelayResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!(ErrorBody::new(message)),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` message of a failure body.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

pub struct RelayService<P> {
    config: RelayConfig,
    predictor: P,
}

impl<P: Predictor> RelayService<P> {
    pub fn new(config: RelayConfig, predictor: P) -> Self {
        Self { config, predictor }
    }

    /// Handle one `/predict-emotion` request.
    ///
    /// The stored upload is removed before this returns, whatever the
    /// outcome.
    pub async fn handle_upload(&self, upload: Option<Upload>) -> RelayResponse {
        let Some(upload) = upload else {
            return RelayResponse::error(400, MSG_NO_FILE);
        };

        let size = upload.bytes.len() as u64;
        if size > self.config.max_upload_bytes {
            warn!(
                file = %upload.file_name,
                size,
                limit = self.config.max_upload_bytes,
                "rejecting oversized upload"
            );
            return RelayResponse::error(413, MSG_TOO_LARGE);
        }

        let stored = match self.store(upload).await {
            Ok(file) => file,
            Err(e) => {
                error!("failed to store upload: {e}");
                return RelayResponse::error(500, MSG_PREDICT_FAILED);
            }
        };

        let response = match std::path::absolute(stored.path()) {
            Ok(path) => self.run_predictor(&path).await,
            Err(e) => {
                error!("failed to resolve upload path: {e}");
                RelayResponse::error(500, MSG_PREDICT_FAILED)
            }
        };

        debug!(path = %stored.path().display(), "removing upload");
        drop(stored);
        response
    }

    async fn store(&self, upload: Upload) -> Result<NamedTempFile, RelayError> {
        let dir = self.config.upload_dir.clone();
        tokio::fs::create_dir_all(&dir).await?;

        let suffix = Path::new(&upload.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&upload.bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| RelayError::Io(std::io::Error::other(e)))??;

        debug!(path = %file.path().display(), "stored upload");
        Ok(file)
    }

    async fn run_predictor(&self, path: &Path) -> RelayResponse {
        let run = match self.predictor.predict(path).await {
            Ok(run) => run,
            Err(e) => {
                error!("predictor failed: {e}");
                return RelayResponse::error(500, MSG_PREDICT_FAILED);
            }
        };

        if !run.success() {
            warn!(exit_code = ?run.exit_code, "predictor exited unsuccessfully");
            return RelayResponse::error(500, MSG_PREDICT_FAILED);
        }

        let stdout = run.stdout.trim();
        debug!("predictor output: {stdout}");

        match parse_predictor_output(stdout) {
            Ok(PredictorOutput::Prediction(prediction)) => {
                info!(emotion = %prediction.emotion, "prediction complete");
                RelayResponse::ok(json!(prediction))
            }
            // Forwarded as-is; the body shape tells the client it failed.
            Ok(PredictorOutput::Failure(body)) => {
                warn!("predictor reported: {}", body.error);
                RelayResponse::ok(json!(body))
            }
            Err(e) => {
                error!("{e}; predictor output: {stdout}");
                RelayResponse::error(500, MSG_INVALID_RESPONSE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::predictor::PredictorRun;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Returns a canned run and remembers what it saw on disk.
    struct CannedPredictor {
        result: Result<PredictorRun, fn() -> RelayError>,
        seen: Mutex<Option<(PathBuf, Vec<u8>)>>,
    }

    impl CannedPredictor {
        fn printing(stdout: &str, exit_code: i32) -> Self {
            Self {
                result: Ok(PredictorRun {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(exit_code),
                }),
                seen: Mutex::new(None),
            }
        }

        fn failing(err: fn() -> RelayError) -> Self {
            Self {
                result: Err(err),
                seen: Mutex::new(None),
            }
        }
    }

    impl Predictor for CannedPredictor {
        async fn predict(&self, audio_path: &Path) -> Result<PredictorRun, RelayError> {
            let bytes = std::fs::read(audio_path)?;
            *self.seen.lock().unwrap() = Some((audio_path.to_path_buf(), bytes));
            match &self.result {
                Ok(run) => Ok(run.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    const PREDICTION: &str = r#"{
        "emotion": "calm",
        "probabilities": {"calm": 70.0, "fearful": 30.0},
        "melSpectrogramBase64": "AAAA",
        "polarPlotBase64": "AAAA"
    }"#;

    fn service(dir: &Path, predictor: CannedPredictor) -> RelayService<CannedPredictor> {
        let mut config = RelayConfig::default();
        config.upload_dir = dir.join("uploads");
        config.max_upload_bytes = 64;
        RelayService::new(config, predictor)
    }

    fn upload(len: usize) -> Option<Upload> {
        Some(Upload {
            file_name: "clip.WAV".into(),
            bytes: vec![7; len],
        })
    }

    #[tokio::test]
    async fn missing_file_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), CannedPredictor::printing(PREDICTION, 0));
        let resp = svc.handle_upload(None).await;
        assert_eq!(resp.status, 400);
        assert_eq!(resp.error_message(), Some(MSG_NO_FILE));
    }

    #[tokio::test]
    async fn oversized_upload_never_reaches_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), CannedPredictor::printing(PREDICTION, 0));
        let resp = svc.handle_upload(upload(65)).await;
        assert_eq!(resp.status, 413);
        assert!(svc.predictor.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn success_forwards_prediction_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), CannedPredictor::printing(PREDICTION, 0));
        let resp = svc.handle_upload(upload(64)).await;

        assert_eq!(resp.status, 200);
        assert!(resp.is_success());
        assert_eq!(resp.body["emotion"], "calm");
        assert_eq!(resp.body["probabilities"]["fearful"], 30.0);
        assert_eq!(resp.body["polarPlotBase64"], "AAAA");

        let (path, bytes) = svc.predictor.seen.lock().unwrap().clone().unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
        assert_eq!(bytes, vec![7; 64]);
        assert!(!path.exists(), "upload should be removed after the request");
    }

    #[tokio::test]
    async fn non_zero_exit_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), CannedPredictor::printing(PREDICTION, 1));
        let resp = svc.handle_upload(upload(8)).await;
        assert_eq!(resp.status, 500);
        assert_eq!(resp.error_message(), Some(MSG_PREDICT_FAILED));

        let (path, _) = svc.predictor.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn spawn_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            dir.path(),
            CannedPredictor::failing(|| RelayError::Timeout { secs: 5 }),
        );
        let resp = svc.handle_upload(upload(8)).await;
        assert_eq!(resp.status, 500);
        assert_eq!(resp.error_message(), Some(MSG_PREDICT_FAILED));
    }

    #[tokio::test]
    async fn garbage_stdout_is_invalid_response() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), CannedPredictor::printing("Loading model...\n{", 0));
        let resp = svc.handle_upload(upload(8)).await;
        assert_eq!(resp.status, 500);
        assert_eq!(resp.error_message(), Some(MSG_INVALID_RESPONSE));
    }

    #[tokio::test]
    async fn predictor_reported_error_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(
            dir.path(),
            CannedPredictor::printing("{\"error\": \"Prediction failed: bad shape\"}", 0),
        );
        let resp = svc.handle_upload(upload(8)).await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.error_message(), Some("Prediction failed: bad shape"));
        assert_eq!(resp.body, json!({"error": "Prediction failed: bad shape"}));

        let (path, _) = svc.predictor.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }
}
