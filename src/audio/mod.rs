//! Decoded audio — the in-memory buffer model plus the decode and render
//! capabilities that produce it.
//!
//! Decoding an arbitrary clip and rendering it down to a deterministic
//! buffer are injected through [`AudioDecoder`] and [`AudioRenderer`], so
//! the WAV encoder never depends on a browser or a codec library.

pub mod buffer;
pub mod decode;
pub mod render;

pub use buffer::AudioBuffer;
pub use decode::{AudioDecoder, SniffingDecoder};
pub use render::{AudioRenderer, MonoMixdown};

#[cfg(feature = "native")]
pub use decode::{Mp3Decoder, WavDecoder};
