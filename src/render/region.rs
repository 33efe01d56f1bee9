use std::collections::HashMap;
use std::sync::Arc;

use crate::crop::smart::{CropPurpose, SmartCropper};
use crate::foundation::core::Rect;
use crate::foundation::error::{VisageError, VisageResult};
use crate::foundation::math::clamp01;
use crate::raster::buffer::ImageBuffer;
use crate::raster::readable::ReadableImage;
use crate::render::blend::lerp_px;
use crate::render::cache::{CacheBudget, CacheStats, ImageCache};

/// Patches covering more than this share of the base area are treated as full portraits.
pub const FULL_PORTRAIT_AREA_RATIO: f64 = 0.7;

/// Patch pixels with alpha below this are treated as empty.
const EMPTY_ALPHA: f64 = 0.01;

/// Key of the fallback entry in a [`FaceRegionTable`].
pub const DEFAULT_REGION_KEY: &str = "Default";

/// Normalized face rectangle (centre and size in `[0, 1]` image units) with a feather radius.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaceRegion {
    /// Horizontal centre.
    pub center_x: f64,
    /// Vertical centre (top-left origin).
    pub center_y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Distance from the edge, in rectangle units, over which the patch fades in.
    pub feather_radius: f64,
}

impl Default for FaceRegion {
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.35,
            width: 0.4,
            height: 0.3,
            feather_radius: 0.05,
        }
    }
}

impl FaceRegion {
    /// Normalized rectangle covered by the region.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.center_x - self.width / 2.0,
            self.center_y - self.height / 2.0,
            self.center_x + self.width / 2.0,
            self.center_y + self.height / 2.0,
        )
    }

    /// Check sizes are positive and the feather stays below half the smaller side.
    pub fn validate(&self) -> VisageResult<()> {
        let all_finite = [
            self.center_x,
            self.center_y,
            self.width,
            self.height,
            self.feather_radius,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(VisageError::validation("face region values must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(VisageError::validation(
                "face region width and height must be > 0",
            ));
        }
        if self.feather_radius < 0.0 {
            return Err(VisageError::validation("feather radius must be >= 0"));
        }
        if self.feather_radius >= self.width.min(self.height) / 2.0 {
            return Err(VisageError::validation(
                "feather radius must be below half the smaller region side",
            ));
        }
        Ok(())
    }
}

/// Face regions per persona with a `"Default"` fallback.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FaceRegionTable {
    regions: HashMap<String, FaceRegion>,
}

impl Default for FaceRegionTable {
    fn default() -> Self {
        let mut regions = HashMap::new();
        regions.insert(DEFAULT_REGION_KEY.to_owned(), FaceRegion::default());
        Self { regions }
    }
}

impl FaceRegionTable {
    /// Region for `persona`, else the `"Default"` entry, else [`FaceRegion::default`].
    pub fn get(&self, persona: &str) -> FaceRegion {
        self.regions
            .get(persona)
            .or_else(|| self.regions.get(DEFAULT_REGION_KEY))
            .copied()
            .unwrap_or_default()
    }

    /// Set or replace the region of `persona` after validating it.
    pub fn set(&mut self, persona: &str, region: FaceRegion) -> VisageResult<()> {
        region.validate()?;
        self.regions.insert(persona.to_owned(), region);
        Ok(())
    }

    /// Validate every entry.
    pub fn validate(&self) -> VisageResult<()> {
        for (name, r) in &self.regions {
            r.validate()
                .map_err(|e| VisageError::config(format!("face region '{name}': {e}")))?;
        }
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Blends face patches into base images with feathered edges.
#[derive(Debug)]
pub struct RegionCompositor {
    cache: ImageCache,
}

impl Default for RegionCompositor {
    fn default() -> Self {
        Self::new(CacheBudget::default())
    }
}

impl RegionCompositor {
    /// Create a compositor whose keyed results honour `budget`.
    pub fn new(budget: CacheBudget) -> Self {
        Self {
            cache: ImageCache::new("region", budget),
        }
    }

    /// Blend `patch` into `base` inside `region`.
    ///
    /// With `auto_crop`, a patch larger than [`FULL_PORTRAIT_AREA_RATIO`] of the base is first
    /// cropped with [`CropPurpose::Expression`]. Blending is best-effort: on any failure the
    /// base is returned unchanged. Results are cached under `cache_key` when one is given.
    #[tracing::instrument(level = "debug", skip(self, cropper, base, patch, region))]
    pub fn blend_region(
        &mut self,
        cropper: &mut SmartCropper,
        base: &Arc<ImageBuffer>,
        patch: &Arc<ImageBuffer>,
        region: &FaceRegion,
        cache_key: Option<&str>,
        auto_crop: bool,
    ) -> Arc<ImageBuffer> {
        if let Some(key) = cache_key
            && let Some(hit) = self.cache.get(key)
        {
            return hit;
        }

        let patch = if auto_crop && is_full_portrait(base, patch) {
            tracing::debug!("patch looks like a full portrait; cropping face band");
            match cropper.crop(patch, CropPurpose::Expression, None) {
                Some(cropped) => cropped,
                None => {
                    tracing::warn!("face crop failed; blending uncropped patch");
                    Arc::clone(patch)
                }
            }
        } else {
            Arc::clone(patch)
        };

        match blend(base, &patch, region) {
            Ok(out) => {
                let out = Arc::new(out);
                if let Some(key) = cache_key {
                    self.cache.insert(key, Arc::clone(&out));
                }
                out
            }
            Err(e) => {
                tracing::error!(error = %e, "region blend failed; keeping base");
                Arc::clone(base)
            }
        }
    }

    /// Drop one cached blend.
    pub fn invalidate(&mut self, cache_key: &str) -> bool {
        self.cache.remove(cache_key)
    }

    /// Drop cached blends whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        self.cache.remove_prefix(prefix)
    }

    /// Drop every cached blend.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn set_budget(&mut self, budget: CacheBudget) {
        self.cache.set_budget(budget);
    }
}

fn is_full_portrait(base: &ImageBuffer, patch: &ImageBuffer) -> bool {
    patch.pixel_area() as f64 > base.pixel_area() as f64 * FULL_PORTRAIT_AREA_RATIO
}

fn feather_weight(u: f64, v: f64, radius: f64) -> f64 {
    if radius <= 0.0 {
        return 1.0;
    }
    let dist = u.min(1.0 - u).min(v).min(1.0 - v);
    clamp01(dist / radius)
}

fn blend(
    base: &Arc<ImageBuffer>,
    patch: &Arc<ImageBuffer>,
    region: &FaceRegion,
) -> VisageResult<ImageBuffer> {
    if !(region.width > 0.0 && region.height > 0.0) {
        return Err(VisageError::geometry(format!(
            "face region {region:?} has no area"
        )));
    }
    let base = ReadableImage::ensure(base)?;
    let patch = ReadableImage::ensure(patch)?;

    let (bw, bh) = (f64::from(base.width()), f64::from(base.height()));
    let rect = region.rect();
    let (x0, y0) = (rect.x0 * bw, rect.y0 * bh);
    let (pw, ph) = (region.width * bw, region.height * bh);
    if !(pw.is_finite() && ph.is_finite() && x0.is_finite() && y0.is_finite()) {
        return Err(VisageError::geometry("face region is not finite"));
    }

    let mut out = ImageBuffer::clone(&base);
    let (sw, sh) = (patch.width(), patch.height());

    let x_start = x0.floor().max(0.0) as u32;
    let y_start = y0.floor().max(0.0) as u32;
    let x_end = (x0 + pw).ceil().clamp(0.0, bw) as u32;
    let y_end = (y0 + ph).ceil().clamp(0.0, bh) as u32;

    for py in y_start..y_end {
        let v = (f64::from(py) - y0) / ph;
        if !(0.0..=1.0).contains(&v) {
            continue;
        }
        let sy = ((v * f64::from(sh)).floor() as u32).min(sh - 1);
        for px in x_start..x_end {
            let u = (f64::from(px) - x0) / pw;
            if !(0.0..=1.0).contains(&u) {
                continue;
            }
            let sx = ((u * f64::from(sw)).floor() as u32).min(sw - 1);
            let p = patch.pixel(sx, sy);
            let alpha = f64::from(p[3]) / 255.0;
            if alpha < EMPTY_ALPHA {
                continue;
            }
            let weight = alpha * feather_weight(u, v, region.feather_radius);
            let blended = lerp_px(base.pixel(px, py), p, weight);
            out.set_pixel(px, py, blended)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/region.rs"]
mod tests;
