use std::sync::Arc;

use smallvec::SmallVec;

use crate::assets::lookup::{AssetLookup, asset_path};
use crate::expression::category::Expression;
use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::ImageBuffer;
use crate::raster::readable::ReadableImage;
use crate::raster::target::RenderTarget;
use crate::render::blend::over_in_place;
use crate::render::cache::{CacheBudget, CacheStats, ImageCache};

/// Outfit id that adds no outfit layer.
pub const DEFAULT_OUTFIT: &str = "default";

/// Which of the two equivalent compositing paths to run.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CompositePath {
    /// Explicit per-pixel source-over into a buffer.
    #[default]
    Cpu,
    /// Sequential alpha-blended blits into a [`RenderTarget`].
    Gpu,
}

/// Optional replacements for the expression's eye and mouth layers.
///
/// Used for blink layers (`closed_eyes`, `half_closed_eyes`) and lip-sync visemes
/// (`A_mouth`, `E_mouth`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerSelection {
    /// Eye layer name replacing `<expression>_eyes`.
    pub eyes: Option<String>,
    /// Mouth layer name replacing `<expression>_mouth`.
    pub mouth: Option<String>,
}

impl LayerSelection {
    /// Selection that only replaces the eye layer.
    pub fn eyes(name: impl Into<String>) -> Self {
        Self {
            eyes: Some(name.into()),
            mouth: None,
        }
    }

    /// Selection that only replaces the mouth layer.
    pub fn mouth(name: impl Into<String>) -> Self {
        Self {
            eyes: None,
            mouth: Some(name.into()),
        }
    }
}

/// Ordered layer names of one composite.
pub type LayerNames = SmallVec<[String; 8]>;

/// Back-to-front layer names for one composite.
pub fn layer_names(expression: Expression, outfit: &str, selection: &LayerSelection) -> LayerNames {
    let mut names = LayerNames::new();
    names.push("background".to_owned());
    names.push("body".to_owned());
    names.push("hair_back".to_owned());
    names.push(
        selection
            .eyes
            .clone()
            .unwrap_or_else(|| expression.eye_layer().to_owned()),
    );
    names.push(
        selection
            .mouth
            .clone()
            .unwrap_or_else(|| expression.mouth_layer().to_owned()),
    );
    names.push("hair_front".to_owned());
    if outfit != DEFAULT_OUTFIT {
        names.push(format!("outfit_{outfit}"));
    }
    names
}

/// Composites persona layers and caches the results.
#[derive(Debug)]
pub struct LayerCompositor {
    base_path: String,
    path: CompositePath,
    parallel: bool,
    cache: ImageCache,
}

impl LayerCompositor {
    /// Create a compositor reading layers from `{base_path}/{persona}/{layer}`.
    pub fn new(
        base_path: impl Into<String>,
        path: CompositePath,
        parallel: bool,
        budget: CacheBudget,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            path,
            parallel,
            cache: ImageCache::new("composite", budget),
        }
    }

    /// Compositing path in use.
    pub fn path(&self) -> CompositePath {
        self.path
    }

    /// Switch compositing path. Cached results stay valid; both paths agree.
    pub fn set_path(&mut self, path: CompositePath) {
        self.path = path;
    }

    /// Composite the standard layers for `(persona, expression, outfit)`.
    ///
    /// Returns `None` when no layer exists.
    pub fn composite(
        &mut self,
        assets: &dyn AssetLookup,
        persona: &str,
        expression: Expression,
        outfit: &str,
    ) -> Option<Arc<ImageBuffer>> {
        self.composite_with(assets, persona, expression, outfit, &LayerSelection::default())
    }

    /// Composite with eye/mouth overrides.
    #[tracing::instrument(level = "debug", skip(self, assets, selection), fields(path = ?self.path))]
    pub fn composite_with(
        &mut self,
        assets: &dyn AssetLookup,
        persona: &str,
        expression: Expression,
        outfit: &str,
        selection: &LayerSelection,
    ) -> Option<Arc<ImageBuffer>> {
        let key = cache_key(persona, expression, outfit, selection);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(key = %key, "composite cache hit");
            return Some(hit);
        }

        let names = layer_names(expression, outfit, selection);
        let layers = self.resolve(assets, persona, &names);
        if layers.is_empty() {
            tracing::warn!(persona, ?expression, outfit, "no layers found");
            return None;
        }

        let result = match self.path {
            CompositePath::Cpu => composite_cpu(&layers, self.parallel),
            CompositePath::Gpu => composite_blit(&layers),
        };
        match result {
            Ok(img) => {
                let img = Arc::new(img);
                self.cache.insert(key, Arc::clone(&img));
                tracing::info!(persona, ?expression, outfit, layers = layers.len(), "composited");
                Some(img)
            }
            Err(e) => {
                tracing::error!(persona, ?expression, outfit, error = %e, "compositing failed");
                None
            }
        }
    }

    /// Composite every expression for `persona` so later requests hit the cache.
    ///
    /// Returns how many expressions produced an image.
    pub fn preload_all(&mut self, assets: &dyn AssetLookup, persona: &str, outfit: &str) -> usize {
        Expression::ALL
            .into_iter()
            .filter(|&e| self.composite(assets, persona, e, outfit).is_some())
            .count()
    }

    /// Drop cached composites of one `(persona, expression)` across outfits and overrides.
    pub fn clear_cache(&mut self, persona: &str, expression: Expression) -> usize {
        self.cache
            .remove_prefix(&format!("{persona}|{}|", expression.name()))
    }

    /// Drop every cached composite of `persona`.
    pub fn release_persona(&mut self, persona: &str) -> usize {
        self.cache.remove_prefix(&format!("{persona}|"))
    }

    /// Drop every cached composite.
    pub fn clear_all(&mut self) {
        self.cache.clear();
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn set_budget(&mut self, budget: CacheBudget) {
        self.cache.set_budget(budget);
    }

    fn resolve(
        &self,
        assets: &dyn AssetLookup,
        persona: &str,
        names: &[String],
    ) -> Vec<(String, Arc<ImageBuffer>)> {
        names
            .iter()
            .filter_map(|name| {
                let path = asset_path(&self.base_path, persona, name);
                match assets.lookup(&path) {
                    Some(img) => Some((name.clone(), img)),
                    None => {
                        tracing::trace!(path = %path, "layer absent");
                        None
                    }
                }
            })
            .collect()
    }
}

fn cache_key(persona: &str, expression: Expression, outfit: &str, sel: &LayerSelection) -> String {
    format!(
        "{persona}|{}|{outfit}|{}|{}",
        expression.name(),
        sel.eyes.as_deref().unwrap_or("-"),
        sel.mouth.as_deref().unwrap_or("-")
    )
}

fn matches_base(name: &str, layer: &ImageBuffer, w: u32, h: u32) -> bool {
    if layer.width() == w && layer.height() == h {
        return true;
    }
    tracing::warn!(
        layer = name,
        width = layer.width(),
        height = layer.height(),
        base_width = w,
        base_height = h,
        "skipping layer with mismatched size"
    );
    false
}

fn base_size(layers: &[(String, Arc<ImageBuffer>)]) -> VisageResult<(u32, u32)> {
    layers
        .first()
        .map(|(_, l)| (l.width(), l.height()))
        .ok_or_else(|| VisageError::validation("no layers to composite"))
}

fn composite_cpu(layers: &[(String, Arc<ImageBuffer>)], parallel: bool) -> VisageResult<ImageBuffer> {
    let (w, h) = base_size(layers)?;
    let mut acc = ImageBuffer::new_transparent(w, h)?;
    for (name, layer) in layers {
        if !matches_base(name, layer, w, h) {
            continue;
        }
        let layer = match ReadableImage::ensure(layer) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(layer = %name, error = %e, "skipping unreadable layer");
                continue;
            }
        };
        over_in_place(acc.storage_mut(), layer.storage(), parallel)?;
    }
    Ok(acc)
}

fn composite_blit(layers: &[(String, Arc<ImageBuffer>)]) -> VisageResult<ImageBuffer> {
    let (w, h) = base_size(layers)?;
    let mut rt = RenderTarget::new(w, h)?;
    let full = rt.full_rect();
    for (name, layer) in layers {
        if matches_base(name, layer, w, h) {
            rt.blit(layer, full)?;
        }
    }
    rt.into_image()
}

#[cfg(test)]
#[path = "../../tests/unit/render/layers.rs"]
mod tests;
