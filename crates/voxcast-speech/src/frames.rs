//! Chunk framing used on the TTS engine's stdout.
//!
//! The engine writes one frame per synthesized chunk:
//!
//! ```text
//! +----------------+---------------------------------+
//! | n: u32 (LE)    | n samples, each an f32 (LE)      |
//! +----------------+---------------------------------+
//! ```
//!
//! Frames follow each other until EOF. Chunk boundaries are preserved so
//! the caller can tell "no chunks" apart from "one empty chunk".

use thiserror::Error;

const HEADER_LEN: usize = 4;
const SAMPLE_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("truncated frame header at byte {offset}")]
    TruncatedHeader { offset: usize },

    #[error("frame at byte {offset} declares {declared} samples but only {available} bytes remain")]
    TruncatedBody {
        offset: usize,
        declared: u32,
        available: usize,
    },
}

/// Splits engine output into chunks, in the order they were written.
pub fn decode_frames(bytes: &[u8]) -> Result<Vec<Vec<f32>>, FrameError> {
    let mut chunks = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + HEADER_LEN)
            .ok_or(FrameError::TruncatedHeader { offset })?;
        let declared = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let body_start = offset + HEADER_LEN;
        let available = bytes.len() - body_start;

        let body_len = (declared as usize)
            .checked_mul(SAMPLE_LEN)
            .filter(|len| *len <= available)
            .ok_or(FrameError::TruncatedBody {
                offset,
                declared,
                available,
            })?;

        let body = &bytes[body_start..body_start + body_len];
        let chunk = body
            .chunks_exact(SAMPLE_LEN)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        chunks.push(chunk);

        offset = body_start + body_len;
    }

    Ok(chunks)
}

/// Encodes one chunk the way an engine is expected to write it.
pub fn encode_frame(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * SAMPLE_LEN);
    out.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}
