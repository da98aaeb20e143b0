use std::fmt;

/// Top-level failure of the decode → render → encode pipeline.
#[derive(Debug)]
pub enum AudioError {
    Buffer(BufferError),
    Decode(DecodeError),
    Render(String),
}

/// A decoded audio buffer that violates the buffer invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    NoChannels,
    ZeroSampleRate,
    TooManyChannels { count: usize },
    ChannelLengthMismatch { channel: usize, expected: usize, found: usize },
    RaggedInterleaved { samples: usize, channels: usize },
    TooLong { bytes: usize },
    ByteRateOverflow { sample_rate: u32, channels: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    UnsupportedFormat(String),
    Malformed(String),
}

/// Predictor stdout that is not a usable prediction.
#[derive(Debug)]
pub enum PredictionError {
    Json(serde_json::Error),
    Base64(base64::DecodeError),
}

/// Failures inside the prediction relay.
#[derive(Debug)]
pub enum RelayError {
    Io(std::io::Error),
    Spawn { program: String, source: std::io::Error },
    Timeout { secs: u64 },
    Config(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Buffer(e) => write!(f, "Invalid audio buffer: {e}"),
            AudioError::Decode(e) => write!(f, "Decode error: {e}"),
            AudioError::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::NoChannels => write!(f, "buffer has no channels"),
            BufferError::ZeroSampleRate => write!(f, "sample rate must be non-zero"),
            BufferError::TooManyChannels { count } => {
                write!(f, "{count} channels overflow the 16-bit block align field")
            }
            BufferError::ChannelLengthMismatch { channel, expected, found } => write!(
                f,
                "channel {channel} has {found} samples, expected {expected}"
            ),
            BufferError::RaggedInterleaved { samples, channels } => write!(
                f,
                "{samples} interleaved samples do not divide into {channels} channels"
            ),
            BufferError::TooLong { bytes } => {
                write!(f, "encoded size of {bytes} bytes exceeds the 32-bit RIFF limit")
            }
            BufferError::ByteRateOverflow { sample_rate, channels } => write!(
                f,
                "{sample_rate} Hz x {channels} channels overflows the 32-bit byte rate"
            ),
        }
    }
}

impl std::error::Error for BufferError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "input is empty"),
            DecodeError::UnsupportedFormat(what) => write!(f, "unsupported audio format: {what}"),
            DecodeError::Malformed(msg) => write!(f, "malformed audio data: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionError::Json(e) => write!(f, "Invalid prediction JSON: {e}"),
            PredictionError::Base64(e) => write!(f, "Invalid base64 image: {e}"),
        }
    }
}

impl std::error::Error for PredictionError {}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Io(e) => write!(f, "I/O error: {e}"),
            RelayError::Spawn { program, source } => {
                write!(f, "Failed to spawn predictor '{program}': {source}")
            }
            RelayError::Timeout { secs } => write!(f, "Predictor timed out after {secs}s"),
            RelayError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<BufferError> for AudioError {
    fn from(e: BufferError) -> Self {
        AudioError::Buffer(e)
    }
}

impl From<DecodeError> for AudioError {
    fn from(e: DecodeError) -> Self {
        AudioError::Decode(e)
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(e: serde_json::Error) -> Self {
        PredictionError::Json(e)
    }
}

impl From<base64::DecodeError> for PredictionError {
    fn from(e: base64::DecodeError) -> Self {
        PredictionError::Base64(e)
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Io(e)
    }
}
