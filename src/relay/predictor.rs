//! External predictor invocation.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error};

use super::config::PredictorConfig;
use crate::error::RelayError;

/// Captured result of one predictor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorRun {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
}

impl PredictorRun {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that classifies the clip stored at a path.
pub trait Predictor {
    fn predict(
        &self,
        audio_path: &Path,
    ) -> impl Future<Output = Result<PredictorRun, RelayError>> + Send;
}

/// Runs `<program> <script> <audio path>` and captures its output.
#[derive(Debug, Clone)]
pub struct ScriptPredictor {
    config: PredictorConfig,
}

impl ScriptPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }
}

impl Predictor for ScriptPredictor {
    async fn predict(&self, audio_path: &Path) -> Result<PredictorRun, RelayError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg(&self.config.script)
            .arg(audio_path)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.config.program,
            script = %self.config.script.display(),
            input = %audio_path.display(),
            "spawning predictor"
        );

        let child = cmd.spawn().map_err(|source| RelayError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        // Dropping the child on timeout kills it.
        let output = match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
                .await
                .map_err(|_| RelayError::Timeout { secs })??,
            None => child.wait_with_output().await?,
        };

        let run = PredictorRun {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        for line in run.stderr.lines().filter(|l| !l.trim().is_empty()) {
            error!("predictor stderr: {line}");
        }

        Ok(run)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script_predictor(dir: &Path, body: &str, timeout_secs: Option<u64>) -> ScriptPredictor {
        let script = dir.join("predict.sh");
        std::fs::write(&script, body).unwrap();
        let mut config = PredictorConfig::default();
        config.program = "sh".into();
        config.script = script;
        config.timeout_secs = timeout_secs;
        ScriptPredictor::new(config)
    }

    #[tokio::test]
    async fn passes_path_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = script_predictor(
            dir.path(),
            "printf '{\"path\":\"%s\",\"onednn\":\"%s\"}' \"$1\" \"$TF_ENABLE_ONEDNN_OPTS\"\n",
            None,
        );
        let run = predictor.predict(Path::new("/tmp/clip.wav")).await.unwrap();
        assert!(run.success());
        assert_eq!(run.stdout, r#"{"path":"/tmp/clip.wav","onednn":"0"}"#);
    }

    #[tokio::test]
    async fn captures_stderr_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = script_predictor(dir.path(), "echo 'model missing' >&2\nexit 3\n", None);
        let run = predictor.predict(Path::new("clip.wav")).await.unwrap();
        assert_eq!(run.exit_code, Some(3));
        assert!(!run.success());
        assert_eq!(run.stderr.trim(), "model missing");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let mut config = PredictorConfig::default();
        config.program = "definitely-not-a-real-interpreter".into();
        config.script = PathBuf::from("predict.py");
        let err = ScriptPredictor::new(config)
            .predict(Path::new("clip.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_kills_slow_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let predictor = script_predictor(dir.path(), "sleep 5\n", Some(1));
        let err = predictor.predict(Path::new("clip.wav")).await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout { secs: 1 }));
    }
}
