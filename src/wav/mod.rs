//! Canonical 16-bit PCM WAV encoding.

pub mod encoder;
pub mod writer;

pub use encoder::{encode_wav, encoded_len, sample_to_pcm16, HEADER_LEN};
pub use writer::ByteWriter;

/// Media type attached to encoded clips before upload.
pub const WAV_MIME_TYPE: &str = "audio/wav";
