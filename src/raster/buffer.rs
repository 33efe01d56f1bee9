use crate::foundation::core::{PixelRect, Rgba8, TRANSPARENT};
use crate::foundation::error::{VisageError, VisageResult};
use crate::foundation::math::Fnv1a64;

/// Whether a buffer's pixels may be addressed directly.
///
/// `GpuOnly` models hardware-resident sources: they can be blitted into a
/// [`crate::RenderTarget`] but any direct pixel read or write fails until the buffer is
/// converted with [`crate::ReadableImage::ensure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PixelAccess {
    /// Pixels can be read and written directly.
    #[default]
    Readable,
    /// Pixels are only reachable through a render-target read-back.
    GpuOnly,
}

/// Raster image in straight (non-premultiplied) RGBA8, row-major, top-left origin.
///
/// Storage is always exactly `width * height * 4` bytes. Buffers are shared through
/// `Arc<ImageBuffer>`; callers must clone the buffer itself before mutating a shared copy.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
    access: PixelAccess,
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("access", &self.access)
            .finish()
    }
}

pub(crate) fn byte_len_for(width: u32, height: u32) -> VisageResult<usize> {
    if width == 0 || height == 0 {
        return Err(VisageError::validation(format!(
            "image dimensions must be > 0 (got {width}x{height})"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| VisageError::validation("image buffer size overflow"))
}

impl ImageBuffer {
    /// Allocate an all-transparent readable buffer.
    pub fn new_transparent(width: u32, height: u32) -> VisageResult<Self> {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Allocate a readable buffer where every pixel is `px`.
    pub fn filled(width: u32, height: u32, px: Rgba8) -> VisageResult<Self> {
        let len = byte_len_for(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
            access: PixelAccess::Readable,
        })
    }

    /// 1x1 readable buffer holding `px`.
    pub fn single_pixel(px: Rgba8) -> Self {
        Self {
            width: 1,
            height: 1,
            data: px.to_vec(),
            access: PixelAccess::Readable,
        }
    }

    /// Wrap existing straight RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> VisageResult<Self> {
        let len = byte_len_for(width, height)?;
        if data.len() != len {
            return Err(VisageError::validation(format!(
                "expected {len} bytes for {width}x{height} rgba8, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            access: PixelAccess::Readable,
        })
    }

    /// Return the same pixels marked with a different access mode.
    pub fn with_access(mut self, access: PixelAccess) -> Self {
        self.access = access;
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel count.
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Allocated bytes (`width * height * 4`).
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Access mode of this buffer.
    pub fn access(&self) -> PixelAccess {
        self.access
    }

    /// Whether direct pixel access is allowed.
    pub fn is_readable(&self) -> bool {
        self.access == PixelAccess::Readable
    }

    /// Raw bytes of a readable buffer.
    pub fn as_bytes(&self) -> VisageResult<&[u8]> {
        self.require_readable()?;
        Ok(&self.data)
    }

    /// Mutable raw bytes of a readable buffer.
    pub fn as_bytes_mut(&mut self) -> VisageResult<&mut [u8]> {
        self.require_readable()?;
        Ok(&mut self.data)
    }

    /// Storage view used by blits and read-backs, which bypass the access check.
    pub(crate) fn storage(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read one pixel.
    pub fn get_pixel(&self, x: u32, y: u32) -> VisageResult<Rgba8> {
        self.require_readable()?;
        let i = self.index_of(x, y)?;
        Ok([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Write one pixel.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba8) -> VisageResult<()> {
        self.require_readable()?;
        let i = self.index_of(x, y)?;
        self.data[i..i + 4].copy_from_slice(&px);
        Ok(())
    }

    /// Copy a rectangular block into a new readable buffer.
    pub fn read_block(&self, rect: PixelRect) -> VisageResult<ImageBuffer> {
        self.require_readable()?;
        if rect.width == 0 || rect.height == 0 {
            return Err(VisageError::geometry(format!(
                "cannot read zero-area block {rect:?}"
            )));
        }
        if !rect.fits_within(self.width, self.height) {
            return Err(VisageError::geometry(format!(
                "block {rect:?} exceeds {}x{} source",
                self.width, self.height
            )));
        }

        let row_bytes = rect.width as usize * 4;
        let mut out = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.bottom() {
            let start = self.row_offset(y) + rect.x as usize * 4;
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        ImageBuffer::from_rgba8(rect.width, rect.height, out)
    }

    /// Overwrite pixels starting at `(x, y)` with the whole of `block`.
    pub fn write_block(&mut self, x: u32, y: u32, block: &ImageBuffer) -> VisageResult<()> {
        self.require_readable()?;
        block.require_readable()?;
        let rect = PixelRect::new(x, y, block.width, block.height);
        if !rect.fits_within(self.width, self.height) {
            return Err(VisageError::geometry(format!(
                "block {rect:?} exceeds {}x{} target",
                self.width, self.height
            )));
        }

        let row_bytes = block.width as usize * 4;
        for row in 0..block.height {
            let dst = self.row_offset(y + row) + x as usize * 4;
            let src = block.row_offset(row);
            self.data[dst..dst + row_bytes].copy_from_slice(&block.data[src..src + row_bytes]);
        }
        Ok(())
    }

    /// Content identity over dimensions and pixel bytes.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_bytes(&self.data);
        h.finish()
    }

    /// Convert into an `image` crate buffer (for encoding).
    pub fn to_rgba_image(&self) -> VisageResult<image::RgbaImage> {
        self.require_readable()?;
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| VisageError::validation("rgba buffer length does not match dimensions"))
    }

    /// Wrap an `image` crate buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> VisageResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_rgba8(width, height, img.into_raw())
    }

    pub(crate) fn row_offset(&self, y: u32) -> usize {
        y as usize * self.width as usize * 4
    }

    fn index_of(&self, x: u32, y: u32) -> VisageResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(VisageError::geometry(format!(
                "pixel ({x},{y}) outside {}x{} image",
                self.width, self.height
            )));
        }
        Ok(self.row_offset(y) + x as usize * 4)
    }

    fn require_readable(&self) -> VisageResult<()> {
        match self.access {
            PixelAccess::Readable => Ok(()),
            PixelAccess::GpuOnly => Err(VisageError::unreadable(format!(
                "{}x{} buffer is gpu-only",
                self.width, self.height
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
