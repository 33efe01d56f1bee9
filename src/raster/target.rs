use crate::foundation::core::{Point, Rect, Rgba8, Size, is_non_degenerate};
use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::{ImageBuffer, byte_len_for};
use crate::render::blend::over;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlitMode {
    AlphaBlend,
    Replace,
}

/// Off-screen render target used by the blit-based compositing path.
///
/// Coordinates are pixels with the origin at the top-left. Blits sample the source with
/// nearest-neighbour filtering, so a blit covering the full target at the source's own size
/// is an exact per-pixel copy or blend.
pub struct RenderTarget {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RenderTarget {
    /// Allocate a target cleared to transparent.
    pub fn new(width: u32, height: u32) -> VisageResult<Self> {
        let len = byte_len_for(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle covering the whole target.
    pub fn full_rect(&self) -> Rect {
        Rect::from_origin_size(
            Point::ORIGIN,
            Size::new(f64::from(self.width), f64::from(self.height)),
        )
    }

    /// Clear every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Draw `src` scaled into `dst`, blending with source-over.
    pub fn blit(&mut self, src: &ImageBuffer, dst: Rect) -> VisageResult<()> {
        self.blit_with(src, dst, BlitMode::AlphaBlend)
    }

    /// Draw `src` scaled into `dst`, overwriting covered pixels.
    pub fn blit_replace(&mut self, src: &ImageBuffer, dst: Rect) -> VisageResult<()> {
        self.blit_with(src, dst, BlitMode::Replace)
    }

    /// Copy the target contents into a new readable buffer.
    pub fn read_back(&self) -> VisageResult<ImageBuffer> {
        ImageBuffer::from_rgba8(self.width, self.height, self.data.clone())
    }

    /// Consume the target, keeping its storage as a readable buffer.
    pub fn into_image(self) -> VisageResult<ImageBuffer> {
        ImageBuffer::from_rgba8(self.width, self.height, self.data)
    }

    fn blit_with(&mut self, src: &ImageBuffer, dst: Rect, mode: BlitMode) -> VisageResult<()> {
        if !is_non_degenerate(dst) {
            return Err(VisageError::geometry(format!(
                "blit destination {dst:?} is degenerate"
            )));
        }

        let x_start = dst.x0.floor().max(0.0) as u32;
        let y_start = dst.y0.floor().max(0.0) as u32;
        let x_end = (dst.x1.ceil().min(f64::from(self.width))).max(0.0) as u32;
        let y_end = (dst.y1.ceil().min(f64::from(self.height))).max(0.0) as u32;

        let (sw, sh) = (src.width(), src.height());
        let pixels = src.storage();

        for py in y_start..y_end {
            let cy = f64::from(py) + 0.5;
            if cy < dst.y0 || cy >= dst.y1 {
                continue;
            }
            let sy = sample_index(cy, dst.y0, dst.height(), sh);
            for px in x_start..x_end {
                let cx = f64::from(px) + 0.5;
                if cx < dst.x0 || cx >= dst.x1 {
                    continue;
                }
                let sx = sample_index(cx, dst.x0, dst.width(), sw);
                let si = (sy as usize * sw as usize + sx as usize) * 4;
                let s: Rgba8 = [pixels[si], pixels[si + 1], pixels[si + 2], pixels[si + 3]];

                let di = (py as usize * self.width as usize + px as usize) * 4;
                let out = match mode {
                    BlitMode::Replace => s,
                    BlitMode::AlphaBlend => {
                        let d = [
                            self.data[di],
                            self.data[di + 1],
                            self.data[di + 2],
                            self.data[di + 3],
                        ];
                        over(d, s)
                    }
                };
                self.data[di..di + 4].copy_from_slice(&out);
            }
        }
        Ok(())
    }
}

fn sample_index(center: f64, origin: f64, extent: f64, src_len: u32) -> u32 {
    let t = (center - origin) / extent;
    ((t * f64::from(src_len)).floor().max(0.0) as u32).min(src_len - 1)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/target.rs"]
mod tests;
