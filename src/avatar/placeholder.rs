use crate::foundation::core::Rgb8;
use crate::foundation::error::VisageResult;
use crate::foundation::math::lerp_u8;
use crate::raster::buffer::ImageBuffer;

/// Side of generated placeholder avatars.
pub const PLACEHOLDER_SIZE: u32 = 512;

/// Square vertical gradient from `color * 1.2` at the top to `color * 0.3` at the bottom.
pub fn generate_placeholder(color: Rgb8, size: u32) -> VisageResult<ImageBuffer> {
    let light = color.scaled(1.2);
    let dark = color.scaled(0.3);
    let mut img = ImageBuffer::new_transparent(size, size)?;

    let span = f64::from(size.saturating_sub(1).max(1));
    let row_bytes = size as usize * 4;
    let data = img.as_bytes_mut()?;
    for (y, row) in data.chunks_exact_mut(row_bytes).enumerate() {
        let t = y as f64 / span;
        let px = [
            lerp_u8(light.r, dark.r, t),
            lerp_u8(light.g, dark.g, t),
            lerp_u8(light.b, dark.b, t),
            255,
        ];
        for out in row.chunks_exact_mut(4) {
            out.copy_from_slice(&px);
        }
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/avatar/placeholder.rs"]
mod tests;
