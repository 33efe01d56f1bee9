use std::sync::Arc;

use crate::foundation::core::{PixelRect, Rect, is_non_degenerate, norm_rect};
use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::ImageBuffer;
use crate::raster::readable::ReadableImage;
use crate::render::cache::{CacheBudget, CacheStats, ImageCache};

/// Mean-luminance level a row or column must exceed to count as subject content.
pub const CONTENT_THRESHOLD: f64 = 0.1;

/// Largest side of the head square cut from a portrait for avatars.
pub const HEAD_CROP_MAX: u32 = 512;

/// Intent of a crop; selects the fixed normalized rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropPurpose {
    /// Lower-middle band used for avatar icons.
    Avatar,
    /// Face band used for expression patches.
    Expression,
    /// Whole image.
    Full,
}

impl CropPurpose {
    /// Fixed normalized rectangle (top-left origin).
    pub fn default_rect(self) -> Rect {
        match self {
            CropPurpose::Avatar => norm_rect(0.1, 0.6, 0.8, 0.4),
            CropPurpose::Expression => norm_rect(0.15, 0.45, 0.7, 0.5),
            CropPurpose::Full => norm_rect(0.0, 0.0, 1.0, 1.0),
        }
    }

    fn key(self) -> &'static str {
        match self {
            CropPurpose::Avatar => "avatar",
            CropPurpose::Expression => "expression",
            CropPurpose::Full => "full",
        }
    }
}

impl std::str::FromStr for CropPurpose {
    type Err = VisageError;

    fn from_str(s: &str) -> VisageResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avatar" => Ok(CropPurpose::Avatar),
            "expression" => Ok(CropPurpose::Expression),
            "full" | "fullimage" | "none" => Ok(CropPurpose::Full),
            _ => Err(VisageError::validation(format!("unknown crop purpose '{s}'"))),
        }
    }
}

/// Scale a normalized rectangle to `width x height` pixels and clamp it inside the image.
///
/// The origin is clamped to `[0, dim - 1]` and the size to `[1, dim - origin]`, so any result
/// lies within bounds and has positive area. Returns `None` for degenerate or non-finite input.
pub fn pixel_rect(rect: Rect, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 || !is_non_degenerate(rect) {
        return None;
    }
    let (w, h) = (f64::from(width), f64::from(height));

    let x = (rect.x0 * w).round().clamp(0.0, w - 1.0) as u32;
    let y = (rect.y0 * h).round().clamp(0.0, h - 1.0) as u32;
    let cw = (rect.width() * w)
        .round()
        .clamp(1.0, f64::from(width - x)) as u32;
    let ch = (rect.height() * h)
        .round()
        .clamp(1.0, f64::from(height - y)) as u32;

    let out = PixelRect::new(x, y, cw, ch);
    (out.area() > 0).then_some(out)
}

/// Estimate the subject's bounding box from row and column luminance profiles.
///
/// Scans inward from each edge for the first row/column whose mean `(r+g+b)/3` exceeds
/// [`CONTENT_THRESHOLD`]. For `Avatar` the box keeps its upper half; for `Expression` the top
/// moves toward the centre by a third of the box height. Falls back to the purpose's fixed
/// rectangle when no content is found.
pub fn analyze_optimal_crop_rect(src: &ReadableImage, purpose: CropPurpose) -> Rect {
    match content_box(src) {
        Some((left, top, right, bottom)) => {
            let (mut top, mut bottom) = (top, bottom);
            match purpose {
                CropPurpose::Avatar => {
                    bottom = bottom.min(top + (bottom - top) / 2);
                }
                CropPurpose::Expression => {
                    let center = (top + bottom) / 2;
                    top = top.max(center.saturating_sub((bottom - top) / 3));
                }
                CropPurpose::Full => {}
            }
            let (w, h) = (f64::from(src.width()), f64::from(src.height()));
            norm_rect(
                f64::from(left) / w,
                f64::from(top) / h,
                f64::from(right - left + 1) / w,
                f64::from(bottom - top + 1) / h,
            )
        }
        None => {
            tracing::warn!(?purpose, "no content above brightness threshold; using fixed rect");
            purpose.default_rect()
        }
    }
}

// Inclusive (left, top, right, bottom) of rows/columns brighter than the threshold.
fn content_box(src: &ReadableImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = (src.width(), src.height());
    let mut rows = vec![0.0f64; h as usize];
    let mut cols = vec![0.0f64; w as usize];

    for y in 0..h {
        for x in 0..w {
            let [r, g, b, _] = src.pixel(x, y);
            let lum = (f64::from(r) + f64::from(g) + f64::from(b)) / (3.0 * 255.0);
            rows[y as usize] += lum;
            cols[x as usize] += lum;
        }
    }
    rows.iter_mut().for_each(|v| *v /= f64::from(w));
    cols.iter_mut().for_each(|v| *v /= f64::from(h));

    let bright = |v: &f64| *v > CONTENT_THRESHOLD;
    let top = rows.iter().position(bright)?;
    let bottom = rows.iter().rposition(bright)?;
    let left = cols.iter().position(bright)?;
    let right = cols.iter().rposition(bright)?;
    Some((left as u32, top as u32, right as u32, bottom as u32))
}

/// Cut a top-anchored, horizontally centred square (side `min(512, w, h)`) from a portrait.
///
/// Never fails: if the portrait cannot be read or the square is empty, the portrait itself is
/// returned.
pub fn crop_head_square(portrait: &Arc<ImageBuffer>) -> Arc<ImageBuffer> {
    match head_square(portrait) {
        Ok(img) => Arc::new(img),
        Err(e) => {
            tracing::warn!(error = %e, "head crop failed; using full portrait");
            Arc::clone(portrait)
        }
    }
}

fn head_square(portrait: &Arc<ImageBuffer>) -> VisageResult<ImageBuffer> {
    let readable = ReadableImage::ensure(portrait)?;
    let (w, h) = (readable.width(), readable.height());
    let side = HEAD_CROP_MAX.min(w).min(h);
    let x = (w - side) / 2;
    readable.read_block(PixelRect::new(x, 0, side.min(w - x), side))
}

/// Cropper with a result cache keyed by source identity, purpose and rectangle.
#[derive(Debug)]
pub struct SmartCropper {
    cache: ImageCache,
}

impl Default for SmartCropper {
    fn default() -> Self {
        Self::new(CacheBudget::default())
    }
}

impl SmartCropper {
    /// Create a cropper whose cache honours `budget`.
    pub fn new(budget: CacheBudget) -> Self {
        Self {
            cache: ImageCache::new("crop", budget),
        }
    }

    /// Crop `source` to `custom` or, when absent, to the fixed rectangle for `purpose`.
    ///
    /// Returns `None` when the rectangle is degenerate or the source cannot be read.
    pub fn crop(
        &mut self,
        source: &Arc<ImageBuffer>,
        purpose: CropPurpose,
        custom: Option<Rect>,
    ) -> Option<Arc<ImageBuffer>> {
        let rect_key = match custom {
            Some(r) => format!("{:.5},{:.5},{:.5},{:.5}", r.x0, r.y0, r.x1, r.y1),
            None => "auto".to_owned(),
        };
        let rect = custom.unwrap_or_else(|| purpose.default_rect());
        self.crop_cached(source, purpose, rect, &rect_key)
    }

    /// Crop using the brightness-profile rectangle from [`analyze_optimal_crop_rect`].
    pub fn crop_smart(
        &mut self,
        source: &Arc<ImageBuffer>,
        purpose: CropPurpose,
    ) -> Option<Arc<ImageBuffer>> {
        let key = cache_key(source, purpose, "smart");
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }
        let readable = match ReadableImage::ensure(source) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "smart crop source unreadable");
                return None;
            }
        };
        let rect = analyze_optimal_crop_rect(&readable, purpose);
        self.finish(&key, extract(&readable, rect))
    }

    /// Drop cached crops.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Estimated cache memory in MiB.
    pub fn memory_mb(&self) -> f64 {
        self.cache.memory_mb()
    }

    pub(crate) fn set_budget(&mut self, budget: CacheBudget) {
        self.cache.set_budget(budget);
    }

    fn crop_cached(
        &mut self,
        source: &Arc<ImageBuffer>,
        purpose: CropPurpose,
        rect: Rect,
        rect_key: &str,
    ) -> Option<Arc<ImageBuffer>> {
        let key = cache_key(source, purpose, rect_key);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }
        let result = ReadableImage::ensure(source).and_then(|r| extract(&r, rect));
        self.finish(&key, result)
    }

    fn finish(&mut self, key: &str, result: VisageResult<ImageBuffer>) -> Option<Arc<ImageBuffer>> {
        match result {
            Ok(img) => {
                let img = Arc::new(img);
                self.cache.insert(key, Arc::clone(&img));
                Some(img)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "crop failed");
                None
            }
        }
    }
}

fn cache_key(source: &ImageBuffer, purpose: CropPurpose, rect_key: &str) -> String {
    format!("{:016x}_{}_{rect_key}", source.fingerprint(), purpose.key())
}

fn extract(src: &ReadableImage, rect: Rect) -> VisageResult<ImageBuffer> {
    let pr = pixel_rect(rect, src.width(), src.height()).ok_or_else(|| {
        VisageError::geometry(format!("crop rect {rect:?} has no pixel area"))
    })?;
    src.read_block(pr)
}

#[cfg(test)]
#[path = "../../tests/unit/crop/smart.rs"]
mod tests;
