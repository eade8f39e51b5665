//! Microsoft ADPCM block decoder
//!
//! Expands fixed-size compressed blocks into interleaved 16-bit samples.
//! Every block is self-contained:
//!
//! ```text
//! [1 byte per channel]  predictor index (0..=6)
//! [2 bytes per channel] initial step delta (i16)
//! [2 bytes per channel] sample1 (i16)
//! [2 bytes per channel] sample2 (i16)
//! [N bytes]             nibbles, high nibble first
//! ```
//!
//! Header fields are interleaved per channel (left then right). Predictor
//! state never crosses a block boundary.

use super::decoder::{DecodeError, DecodeResult};
use super::riff::read_i16_le;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Step delta adaptation, indexed by the unsigned nibble.
#[rustfmt::skip]
pub static ADAPTATION_TABLE: [i32; 16] = [
    230, 230, 230, 230, 307, 409, 512, 614,
    768, 614, 512, 409, 307, 230, 230, 230,
];

/// First predictor coefficient, indexed by the block's predictor index.
pub static ADAPT_COEFF1: [i32; 7] = [256, 512, 0, 192, 240, 460, 392];

/// Second predictor coefficient, indexed by the block's predictor index.
pub static ADAPT_COEFF2: [i32; 7] = [0, -256, 0, 64, 0, -208, -232];

/// Smallest step delta after adaptation.
const MIN_DELTA: i32 = 16;

/// Block header bytes per channel.
pub const HEADER_BYTES_PER_CHANNEL: usize = 7;

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Per-channel predictor state for one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictorState {
    pub predictor: i32,
    pub sample1: i32,
    pub sample2: i32,
    pub coeff1: i32,
    pub coeff2: i32,
    pub delta: i32,
}

impl PredictorState {
    /// Fresh state for a predictor table index, clamped to 0..=6
    pub fn new(predictor: u8) -> Self {
        let index = predictor.min(6) as usize;
        Self {
            predictor: index as i32,
            coeff1: ADAPT_COEFF1[index],
            coeff2: ADAPT_COEFF2[index],
            ..Self::default()
        }
    }

    /// Decode one 4-bit nibble and advance the state
    pub fn expand_nibble(&mut self, nibble: u8) -> i16 {
        let nibble = (nibble & 0x0F) as i32;
        let signed = if nibble & 0x08 != 0 { nibble - 0x10 } else { nibble };

        // i64: delta is unbounded on malformed input
        let predicted = (self.sample1 as i64 * self.coeff1 as i64
            + self.sample2 as i64 * self.coeff2 as i64)
            / 256
            + signed as i64 * self.delta as i64;
        let predicted = predicted.clamp(i16::MIN as i64, i16::MAX as i64) as i32;

        self.sample2 = self.sample1;
        self.sample1 = predicted;

        let delta = ADAPTATION_TABLE[nibble as usize] as i64 * self.delta as i64 / 256;
        self.delta = delta.clamp(MIN_DELTA as i64, i32::MAX as i64) as i32;

        predicted as i16
    }
}

// ---------------------------------------------------------------------------
// Block decoding
// ---------------------------------------------------------------------------

fn check_channels(channels: u16) -> DecodeResult<usize> {
    match channels {
        1 | 2 => Ok(channels as usize),
        n => Err(DecodeError::UnsupportedFormat(format!(
            "MS ADPCM with {} channels",
            n
        ))),
    }
}

/// Number of 16-bit samples (all channels) produced by one block
pub fn samples_per_block(block_align: usize, channels: u16) -> usize {
    let channels = channels as usize;
    let header = HEADER_BYTES_PER_CHANNEL * channels;
    if channels == 0 || block_align < header {
        return 0;
    }
    2 * channels + (block_align - header) * 2
}

/// Decode one block, appending little-endian samples to `out`
///
/// `block` is exactly one block; `channels` is 1 or 2.
pub fn decode_block(block: &[u8], channels: u16, out: &mut Vec<u8>) -> DecodeResult<()> {
    let channels = check_channels(channels)?;
    let header = HEADER_BYTES_PER_CHANNEL * channels;
    if block.len() < header {
        return Err(DecodeError::InvalidData(format!(
            "ADPCM block of {} bytes is shorter than its {} byte header",
            block.len(),
            header
        )));
    }

    let mut state = [PredictorState::default(); 2];
    let mut pos = 0;

    for ch in state.iter_mut().take(channels) {
        *ch = PredictorState::new(block[pos]);
        pos += 1;
    }
    for ch in state.iter_mut().take(channels) {
        ch.delta = read_i16_le(block, pos)? as i32;
        pos += 2;
    }
    for ch in state.iter_mut().take(channels) {
        ch.sample1 = read_i16_le(block, pos)? as i32;
        pos += 2;
    }
    for ch in state.iter_mut().take(channels) {
        ch.sample2 = read_i16_le(block, pos)? as i32;
        pos += 2;
    }

    for ch in state.iter().take(channels) {
        out.extend_from_slice(&(ch.sample1 as i16).to_le_bytes());
    }
    for ch in state.iter().take(channels) {
        out.extend_from_slice(&(ch.sample2 as i16).to_le_bytes());
    }

    let right = channels - 1;
    for &byte in &block[pos..] {
        let hi = state[0].expand_nibble(byte >> 4);
        out.extend_from_slice(&hi.to_le_bytes());
        let lo = state[right].expand_nibble(byte & 0x0F);
        out.extend_from_slice(&lo.to_le_bytes());
    }

    Ok(())
}

/// Decode every whole block of `payload`
///
/// A trailing partial block is ignored.
pub fn decode(payload: &[u8], block_align: usize, channels: u16) -> DecodeResult<Vec<u8>> {
    check_channels(channels)?;
    let per_block = samples_per_block(block_align, channels);
    if per_block == 0 {
        return Err(DecodeError::InvalidData(format!(
            "ADPCM block align {} too small for {} channels",
            block_align, channels
        )));
    }

    let blocks = payload.len() / block_align;
    let mut out = Vec::with_capacity(blocks * per_block * 2);
    for block in payload.chunks_exact(block_align) {
        decode_block(block, channels, &mut out)?;
    }

    Ok(out)
}
