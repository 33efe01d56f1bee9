use anyhow::Context;

use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::ImageBuffer;

/// Decode encoded image bytes (PNG, JPEG, ...) into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> VisageResult<ImageBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| VisageError::decode(format!("{e:#}")))?;
    ImageBuffer::from_rgba_image(dyn_img.to_rgba8())
}

/// Encode a readable buffer as PNG bytes.
pub fn encode_png(img: &ImageBuffer) -> VisageResult<Vec<u8>> {
    let rgba = img.to_rgba_image()?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
