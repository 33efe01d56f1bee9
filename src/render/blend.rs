use rayon::prelude::*;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{VisageError, VisageResult};
use crate::foundation::math::lerp_u8;

// Below this many bytes the rayon split costs more than it saves.
const PARALLEL_MIN_BYTES: usize = 64 * 1024;

/// Source-over for straight alpha: `rgb = base*(1-a) + layer*a`, `alpha = max(base, layer)`.
///
/// A fully transparent base carries no colour, so the layer is taken as-is there.
pub fn over(base: Rgba8, layer: Rgba8) -> Rgba8 {
    let a = u16::from(layer[3]);
    if a == 0 {
        return base;
    }
    if base[3] == 0 || a == 255 {
        return layer;
    }

    let inv = 255 - a;
    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = ((u32::from(base[i]) * u32::from(inv) + u32::from(layer[i]) * u32::from(a) + 127)
            / 255) as u8;
    }
    out[3] = base[3].max(layer[3]);
    out
}

/// Channel-wise linear interpolation (all four channels) by an 8-bit weight.
pub fn crossfade(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u32;
    let it = 255 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = ((u32::from(a[i]) * it + u32::from(b[i]) * tt + 127) / 255) as u8;
    }
    out
}

/// Channel-wise linear interpolation with a full-precision weight.
pub fn lerp_px(base: Rgba8, patch: Rgba8, weight: f64) -> Rgba8 {
    [
        lerp_u8(base[0], patch[0], weight),
        lerp_u8(base[1], patch[1], weight),
        lerp_u8(base[2], patch[2], weight),
        lerp_u8(base[3], patch[3], weight),
    ]
}

/// Apply [`over`] pixel-wise across two equally sized RGBA8 byte buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8], parallel: bool) -> VisageResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VisageError::dimension_mismatch(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }

    let blend_px = |(d, s): (&mut [u8], &[u8])| {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    };

    if parallel && dst.len() >= PARALLEL_MIN_BYTES {
        dst.par_chunks_exact_mut(4)
            .zip(src.par_chunks_exact(4))
            .for_each(blend_px);
    } else {
        dst.chunks_exact_mut(4)
            .zip(src.chunks_exact(4))
            .for_each(blend_px);
    }
    Ok(())
}

/// Replace `dst` with `crossfade(dst, other, t)` pixel-wise.
pub fn crossfade_in_place(dst: &mut [u8], other: &[u8], t: f32) -> VisageResult<()> {
    if dst.len() != other.len() || !dst.len().is_multiple_of(4) {
        return Err(VisageError::dimension_mismatch(
            "crossfade_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, o) in dst.chunks_exact_mut(4).zip(other.chunks_exact(4)) {
        let out = crossfade([d[0], d[1], d[2], d[3]], [o[0], o[1], o[2], o[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
