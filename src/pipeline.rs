//! Convert pipeline — decodes an arbitrary clip, renders it to mono, and
//! re-encodes it as 16-bit PCM WAV ready for upload.

use tracing::debug;

use crate::audio::{AudioDecoder, AudioRenderer};
use crate::error::{AudioError, DecodeError};
use crate::wav::{WAV_MIME_TYPE, encode_wav};

/// Encoded WAV bytes tagged with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl WavBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Run decode → render → encode on one clip.
///
/// A decode or render failure is returned as-is and the encoder is never
/// reached, so no partial WAV is produced.
pub fn convert_to_wav(
    input: &[u8],
    decoder: &dyn AudioDecoder,
    renderer: &dyn AudioRenderer,
) -> Result<WavBlob, AudioError> {
    if input.is_empty() {
        return Err(DecodeError::Empty.into());
    }

    let decoded = decoder.decode(input)?;
    debug!(
        channels = decoded.number_of_channels(),
        sample_rate = decoded.sample_rate(),
        frames = decoded.length(),
        "decoded clip"
    );

    let rendered = renderer.render(decoded)?;
    debug!(
        channels = rendered.number_of_channels(),
        frames = rendered.length(),
        "rendered clip"
    );

    let bytes = encode_wav(&rendered);
    debug!(bytes = bytes.len(), "encoded WAV");

    Ok(WavBlob {
        bytes,
        mime_type: WAV_MIME_TYPE,
    })
}
