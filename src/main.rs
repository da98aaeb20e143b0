//! emotion-relay — command-line front end for the convert pipeline and the
//! prediction relay.
//!
//! JSON results go to stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use emotion_recognizer_core::audio::{MonoMixdown, SniffingDecoder};
use emotion_recognizer_core::pipeline::{WavBlob, convert_to_wav};
use emotion_recognizer_core::relay::{RelayConfig, RelayService, ScriptPredictor, Upload};

#[derive(Debug, Parser)]
#[command(name = "emotion-relay", version, about = "Re-encode clips and relay them to the emotion predictor")]
struct Cli {
    /// Relay config file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a WAV/MP3 clip, mix it to mono and write 16-bit PCM WAV.
    Convert { input: PathBuf, output: PathBuf },

    /// Run the relay on a local clip and print the response body.
    Predict {
        audio: PathBuf,
        /// Re-encode to mono 16-bit WAV before handing it to the predictor.
        #[arg(long)]
        normalize: bool,
    },

    /// Upload a clip to a running backend.
    #[cfg(feature = "client")]
    Upload {
        audio: PathBuf,
        /// Backend base URL. Defaults to http://localhost:<port>.
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        normalize: bool,
    },

    /// Print the effective configuration.
    Config {
        /// Also write it to the config file.
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RelayConfig::load_or_default().context("Failed to load configuration")?,
    };
    if let Some(path) = &config.config_path {
        info!("Configuration loaded from {}", path.display());
    }

    match cli.command {
        Command::Convert { input, output } => {
            let blob = convert_file(&input)?;
            std::fs::write(&output, &blob.bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} bytes to {}", blob.len(), output.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Predict { audio, normalize } => {
            let upload = load_upload(&audio, normalize)?;
            let predictor = ScriptPredictor::new(config.predictor.clone());
            let service = RelayService::new(config, predictor);
            let response = service.handle_upload(Some(upload)).await;

            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if response.is_success() && response.error_message().is_none() {
                Ok(ExitCode::SUCCESS)
            } else {
                warn!("Relay returned status {}", response.status);
                Ok(ExitCode::FAILURE)
            }
        }
        #[cfg(feature = "client")]
        Command::Upload { audio, url, normalize } => {
            let upload = load_upload(&audio, normalize)?;
            let url = url.unwrap_or_else(|| config.backend_url());
            let client = emotion_recognizer_core::client::PredictionClient::new(url);
            let prediction = client
                .predict_bytes(&upload.file_name, upload.bytes)
                .await
                .context("Upload failed")?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { write } => {
            print!("{}", config.to_toml()?);
            if write {
                let path = match cli.config.or_else(RelayConfig::default_config_path) {
                    Some(path) => path,
                    None => anyhow::bail!("No config directory available on this platform"),
                };
                config.save(&path)?;
                info!("Configuration written to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn convert_file(input: &Path) -> Result<WavBlob> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    convert_to_wav(&bytes, &SniffingDecoder::native(), &MonoMixdown)
        .with_context(|| format!("Failed to convert {}", input.display()))
}

/// Read a clip for upload, optionally re-encoding it as mono WAV.
fn load_upload(path: &Path, normalize: bool) -> Result<Upload> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("recording.wav")
        .to_string();

    if normalize {
        let blob = convert_file(path)?;
        let stem = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording");
        return Ok(Upload {
            file_name: format!("{stem}.wav"),
            bytes: blob.bytes,
        });
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Upload { file_name, bytes })
}
