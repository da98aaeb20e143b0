//! Fixed-size little-endian byte writer.

/// Owns a zero-filled buffer of a known size and writes typed values at an
/// explicit, monotonically advancing offset.
///
/// Writing past the end of the buffer panics; callers size it up front.
#[derive(Debug, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    pub fn with_len(len: usize) -> Self {
        ByteWriter {
            buf: vec![0; len],
            pos: 0,
        }
    }

    /// Current write offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Write a four-character chunk tag such as `b"RIFF"`.
    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.write_bytes(tag);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Hand back the buffer, including any unwritten (zero) tail.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
