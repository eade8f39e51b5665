//! Sample conversion to canonical 16-bit PCM
//!
//! Stateless conversions from the integer and IEEE float encodings found
//! in WAVE payloads to little-endian signed 16-bit samples.

/// Clamp bound for float conversion.
///
/// Floats are scaled by this value and clamped to `[-FLOAT_SCALE, FLOAT_SCALE]`,
/// which leaves headroom below `i16::MAX` for slightly over-unity input.
pub const FLOAT_SCALE: i32 = 32167;

/// Source sample encoding of a WAVE payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Unsigned 8-bit integer
    Pcm8,
    /// Signed 16-bit integer, already canonical
    Pcm16,
    /// Signed 24-bit integer, packed in 3 bytes
    Pcm24,
    /// Signed 32-bit integer
    Pcm32,
    /// IEEE 754 single precision
    Float32,
    /// IEEE 754 double precision
    Float64,
}

impl SampleEncoding {
    /// Integer PCM encoding for a bit depth
    pub fn from_int_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(SampleEncoding::Pcm8),
            16 => Some(SampleEncoding::Pcm16),
            24 => Some(SampleEncoding::Pcm24),
            32 => Some(SampleEncoding::Pcm32),
            _ => None,
        }
    }

    /// IEEE float encoding for a bit depth
    pub fn from_float_bits(bits: u16) -> Option<Self> {
        match bits {
            32 => Some(SampleEncoding::Float32),
            64 => Some(SampleEncoding::Float64),
            _ => None,
        }
    }

    /// Size of one source sample in bytes
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleEncoding::Pcm8 => 1,
            SampleEncoding::Pcm16 => 2,
            SampleEncoding::Pcm24 => 3,
            SampleEncoding::Pcm32 | SampleEncoding::Float32 => 4,
            SampleEncoding::Float64 => 8,
        }
    }

    /// Number of canonical bytes produced from `input_len` source bytes
    ///
    /// 24-bit input yields `len / 3 * 2`, 32-bit integer and float input
    /// yields `len / 2`, 64-bit float yields `len / 4`. Trailing bytes that
    /// do not form a whole sample are dropped.
    pub fn output_len(&self, input_len: usize) -> usize {
        input_len / self.bytes_per_sample() * 2
    }

    /// Returns true if no conversion is needed
    pub fn is_canonical(&self) -> bool {
        matches!(self, SampleEncoding::Pcm16)
    }
}

/// Convert one float sample
///
/// `round(f * 32167)` clamped to `[-32167, 32167]`.
pub fn ieee_to_i16(f: f64) -> i16 {
    let v = (f * FLOAT_SCALE as f64).round();
    v.clamp(-(FLOAT_SCALE as f64), FLOAT_SCALE as f64) as i16
}

/// Convert one packed little-endian 24-bit sample
///
/// The value is sign-extended from bit 23 and the output is
/// `(v << 8) & 0xFFFF`, taken as a 16-bit pattern.
pub fn int24_to_i16(b: [u8; 3]) -> i16 {
    let mut v = (b[2] as i32) << 16 | (b[1] as i32) << 8 | b[0] as i32;
    if v & 0x80_0000 != 0 {
        v |= !0xFF_FFFF;
    }
    ((v << 8) & 0xFFFF) as u16 as i16
}

/// Convert one 32-bit integer sample by keeping its high 16 bits
pub fn int32_to_i16(v: i32) -> i16 {
    (v >> 16) as i16
}

/// Convert one unsigned 8-bit sample
pub fn uint8_to_i16(b: u8) -> i16 {
    (b as i16 - 128) << 8
}

fn convert_sample(encoding: SampleEncoding, s: &[u8]) -> i16 {
    match encoding {
        SampleEncoding::Pcm8 => uint8_to_i16(s[0]),
        SampleEncoding::Pcm16 => i16::from_le_bytes([s[0], s[1]]),
        SampleEncoding::Pcm24 => int24_to_i16([s[0], s[1], s[2]]),
        SampleEncoding::Pcm32 => int32_to_i16(i32::from_le_bytes([s[0], s[1], s[2], s[3]])),
        SampleEncoding::Float32 => {
            ieee_to_i16(f32::from_le_bytes([s[0], s[1], s[2], s[3]]) as f64)
        }
        SampleEncoding::Float64 => ieee_to_i16(f64::from_le_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ])),
    }
}

/// Convert `src` into `dst`
///
/// `dst` must hold at least `encoding.output_len(src.len())` bytes.
///
/// # Returns
/// Number of bytes written
pub fn convert_into(encoding: SampleEncoding, src: &[u8], dst: &mut [u8]) -> usize {
    let width = encoding.bytes_per_sample();
    let mut written = 0;

    for (sample, out) in src.chunks_exact(width).zip(dst.chunks_exact_mut(2)) {
        out.copy_from_slice(&convert_sample(encoding, sample).to_le_bytes());
        written += 2;
    }

    written
}

/// Convert `src` into a newly allocated canonical buffer
pub fn convert(encoding: SampleEncoding, src: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; encoding.output_len(src.len())];
    let written = convert_into(encoding, src, &mut out);
    out.truncate(written);
    out
}
