// src/mulaw.rs
//
// 8-bit mu-law companding. Codes are stored complemented, so 0xFF is silence
// and 0x00 is the most negative amplitude. Bit-exact with the classic
// 13-bit-magnitude variant (bias 33, clip 0x1FFF).

pub const BIAS: i32 = 33;
pub const CLIP: i32 = 0x1FFF;
pub const FULL_SCALE: f32 = 32768.0;

/// Largest magnitude `decode` can produce (segment 7, mantissa 15).
pub const MAX_AMPLITUDE: f32 = 8031.0 / FULL_SCALE;

const SIGN_BIT: u8 = 0x80;
const TOP_POSITION: u32 = 12;
const MIN_POSITION: u32 = 5;

/// Split a sample into (sign bit, biased and clipped magnitude).
#[inline]
fn biased_magnitude(sample: f32) -> (u8, i32) {
    // `as` saturates, so +1.0 lands on i16::MAX instead of wrapping.
    let number = (sample * FULL_SCALE) as i16 as i32;
    let (sign, magnitude) = if number < 0 {
        (SIGN_BIT, -number)
    } else {
        (0, number)
    };
    (sign, (magnitude + BIAS).min(CLIP))
}

/// Segment position: index of the highest set bit, scanning 12 down to 5.
#[inline]
fn segment_position(magnitude: i32) -> u32 {
    let mut position = TOP_POSITION;
    let mut mask = 1 << TOP_POSITION;
    while magnitude & mask != mask && position > MIN_POSITION {
        mask >>= 1;
        position -= 1;
    }
    position
}

pub fn encode(sample: f32) -> u8 {
    let (sign, magnitude) = biased_magnitude(sample);
    let position = segment_position(magnitude);
    let mantissa = ((magnitude >> (position - 4)) & 0x0F) as u8;
    let exponent = ((position - MIN_POSITION) as u8) << 4;
    !(sign | exponent | mantissa)
}

pub fn decode(code: u8) -> f32 {
    let code = !code;
    let negative = code & SIGN_BIT != 0;
    let code = code & !SIGN_BIT;

    let position = (((code & 0xF0) >> 4) as u32) + MIN_POSITION;
    let mantissa = (code & 0x0F) as i32;
    let magnitude =
        ((1 << position) | (mantissa << (position - 4)) | (1 << (position - 5))) - BIAS;

    let value = if negative { -magnitude } else { magnitude };
    value as f32 / FULL_SCALE
}

/// Width of the segment `sample` encodes into, in amplitude units.
pub fn quantization_step(sample: f32) -> f32 {
    let (_, magnitude) = biased_magnitude(sample);
    (1 << (segment_position(magnitude) - 4)) as f32 / FULL_SCALE
}
