use std::ops::Deref;
use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::VisageResult;
use crate::raster::buffer::ImageBuffer;
use crate::raster::target::RenderTarget;

/// An image whose pixels are guaranteed to be directly addressable.
///
/// This is the single conversion point for hardware-resident sources: components that inspect
/// raw pixels call [`ReadableImage::ensure`] once at their boundary and then index pixels
/// without further access checks.
#[derive(Clone, Debug)]
pub struct ReadableImage(Arc<ImageBuffer>);

impl ReadableImage {
    /// Pass readable sources through; read `GpuOnly` sources back through a render target.
    pub fn ensure(src: &Arc<ImageBuffer>) -> VisageResult<Self> {
        if src.is_readable() {
            return Ok(Self(Arc::clone(src)));
        }

        tracing::debug!(
            width = src.width(),
            height = src.height(),
            "reading back gpu-only image"
        );
        let mut rt = RenderTarget::new(src.width(), src.height())?;
        let full = rt.full_rect();
        rt.blit_replace(src, full)?;
        Ok(Self(Arc::new(rt.into_image()?)))
    }

    /// Pixel at `(x, y)`. Coordinates must be in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.0.row_offset(y) + x as usize * 4;
        let d = self.0.storage();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }

    /// Shared handle to the underlying buffer.
    pub fn buffer(&self) -> &Arc<ImageBuffer> {
        &self.0
    }

    /// Give up the readable guarantee and return the buffer handle.
    pub fn into_inner(self) -> Arc<ImageBuffer> {
        self.0
    }
}

impl Deref for ReadableImage {
    type Target = ImageBuffer;

    fn deref(&self) -> &ImageBuffer {
        &self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/readable.rs"]
mod tests;
