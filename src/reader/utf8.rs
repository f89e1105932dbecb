//! Incremental UTF-8 decoding across buffer fills.

use crate::error::{Error, Result};

/// Decodes UTF-8 handed over in arbitrary chunks, never validating a partial code point.
///
/// When a chunk ends inside a multi-byte sequence, the incomplete tail is held back and
/// completed from the start of the next chunk.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: [u8; 4],
    pending_len: usize,
}

impl Utf8Decoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk`, appending every complete code point to `out`.
    pub(crate) fn decode(&mut self, mut chunk: &[u8], out: &mut String) -> Result<()> {
        if self.pending_len > 0 {
            let width = sequence_width(self.pending[0]);
            let take = (width - self.pending_len).min(chunk.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&chunk[..take]);
            self.pending_len += take;
            chunk = &chunk[take..];

            if self.pending_len < width {
                return Ok(());
            }
            out.push_str(validate(&self.pending[..width])?);
            self.pending_len = 0;
        }

        let complete = complete_prefix_len(chunk);
        out.push_str(validate(&chunk[..complete])?);

        let tail = &chunk[complete..];
        self.pending[..tail.len()].copy_from_slice(tail);
        self.pending_len = tail.len();
        Ok(())
    }

    /// Fails if the input ended in the middle of a code point.
    pub(crate) fn finish(self) -> Result<()> {
        if self.pending_len > 0 {
            return Err(Error::utf8_encoding());
        }
        Ok(())
    }
}

fn validate(bytes: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| Error::utf8_encoding())
}

/// The number of bytes in the sequence introduced by `lead`. Bytes that cannot start a
/// sequence report 1 so validation rejects them where they stand.
fn sequence_width(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// The length of the longest prefix of `bytes` that does not end inside a multi-byte sequence.
///
/// Only the last three bytes can belong to an incomplete sequence, so only they are inspected.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            // continuation byte, keep looking for the lead
            continue;
        }
        let width = sequence_width(byte);
        return if width > back { len - back } else { len };
    }
    len
}
