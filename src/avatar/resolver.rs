use std::sync::Arc;

use crate::assets::lookup::{AssetLookup, asset_path};
use crate::avatar::placeholder::{PLACEHOLDER_SIZE, generate_placeholder};
use crate::crop::smart::crop_head_square;
use crate::expression::category::Expression;
use crate::expression::source::ExpressionSource;
use crate::foundation::core::Rgb8;
use crate::raster::buffer::ImageBuffer;
use crate::render::cache::{CacheBudget, CacheStats, ImageCache};
use crate::render::layers::{DEFAULT_OUTFIT, LayerCompositor};

/// File names tried, in order, for a persona's base avatar.
pub const BASE_AVATAR_NAMES: [&str; 6] = ["base", "neutral", "Base", "Neutral", "default", "Default"];

/// Inputs available to avatar strategies.
pub struct AvatarContext<'a> {
    /// Persona id.
    pub persona: &'a str,
    /// Requested expression (`None` = no preference).
    pub expression: Option<Expression>,
    /// Expression suffix with variant index, empty for neutral.
    pub suffix: &'a str,
    /// `{category}` prefix of avatar assets.
    pub avatar_base: &'a str,
    /// Raw asset store.
    pub assets: &'a dyn AssetLookup,
    /// Portrait compositor used by the crop fallback.
    pub compositor: &'a mut LayerCompositor,
    /// Persona colour for the placeholder.
    pub color: Rgb8,
}

/// One step of the avatar fallback chain.
pub type AvatarStrategy = fn(&mut AvatarContext<'_>) -> Option<Arc<ImageBuffer>>;

/// Expression-specific avatar file, e.g. `avatars/Echo/happy2`.
pub fn expression_asset(ctx: &mut AvatarContext<'_>) -> Option<Arc<ImageBuffer>> {
    match ctx.expression {
        Some(e) if e != Expression::Neutral && !ctx.suffix.is_empty() => {
            let file = ctx.suffix.trim_start_matches('_').to_lowercase();
            ctx.assets
                .lookup(&asset_path(ctx.avatar_base, ctx.persona, &file))
        }
        _ => None,
    }
}

/// First existing base avatar among [`BASE_AVATAR_NAMES`].
pub fn base_asset(ctx: &mut AvatarContext<'_>) -> Option<Arc<ImageBuffer>> {
    BASE_AVATAR_NAMES
        .iter()
        .find_map(|name| ctx.assets.lookup(&asset_path(ctx.avatar_base, ctx.persona, name)))
}

/// Head square cut from the composited portrait.
pub fn portrait_crop(ctx: &mut AvatarContext<'_>) -> Option<Arc<ImageBuffer>> {
    let expression = ctx.expression.unwrap_or_default();
    let portrait = ctx
        .compositor
        .composite(ctx.assets, ctx.persona, expression, DEFAULT_OUTFIT)?;
    Some(crop_head_square(&portrait))
}

/// Generated gradient; only fails if allocation of a 512x512 buffer is rejected.
pub fn placeholder(ctx: &mut AvatarContext<'_>) -> Option<Arc<ImageBuffer>> {
    match generate_placeholder(ctx.color, PLACEHOLDER_SIZE) {
        Ok(img) => Some(Arc::new(img)),
        Err(e) => {
            tracing::error!(error = %e, "placeholder generation failed");
            None
        }
    }
}

/// Standard fallback order.
pub const DEFAULT_STRATEGIES: [(&str, AvatarStrategy); 4] = [
    ("expression_asset", expression_asset),
    ("base_asset", base_asset),
    ("portrait_crop", portrait_crop),
    ("placeholder", placeholder),
];

/// Resolves avatar images through an ordered strategy list and caches the result.
pub struct AvatarResolver {
    avatar_base: String,
    strategies: Vec<(&'static str, AvatarStrategy)>,
    cache: ImageCache,
}

impl std::fmt::Debug for AvatarResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarResolver")
            .field("avatar_base", &self.avatar_base)
            .field("strategies", &self.strategy_names())
            .field("cache", &self.cache)
            .finish()
    }
}

impl AvatarResolver {
    /// Resolver over `{avatar_base}/{persona}/...` with [`DEFAULT_STRATEGIES`].
    pub fn new(avatar_base: impl Into<String>, budget: CacheBudget) -> Self {
        Self {
            avatar_base: avatar_base.into(),
            strategies: DEFAULT_STRATEGIES.to_vec(),
            cache: ImageCache::new("avatar", budget),
        }
    }

    /// Replace the strategy list.
    pub fn with_strategies(mut self, strategies: Vec<(&'static str, AvatarStrategy)>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Names of the strategies in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(n, _)| *n).collect()
    }

    /// Resolve an avatar for `persona`. Always returns an image.
    #[tracing::instrument(level = "debug", skip(self, assets, compositor, expressions, color))]
    pub fn resolve(
        &mut self,
        assets: &dyn AssetLookup,
        compositor: &mut LayerCompositor,
        expressions: &dyn ExpressionSource,
        persona: &str,
        expression: Option<Expression>,
        color: Rgb8,
    ) -> Arc<ImageBuffer> {
        let suffix = match expression {
            Some(e) if e != Expression::Neutral => expressions.expression_suffix(persona, e),
            _ => String::new(),
        };
        let key = cache_key(persona, &suffix);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let mut ctx = AvatarContext {
            persona,
            expression,
            suffix: &suffix,
            avatar_base: &self.avatar_base,
            assets,
            compositor,
            color,
        };

        let found = self
            .strategies
            .iter()
            .find_map(|(name, strategy)| {
                let img = strategy(&mut ctx)?;
                tracing::info!(persona, strategy = *name, "avatar resolved");
                Some(img)
            });

        let img = match found {
            Some(img) => img,
            None => {
                tracing::warn!(persona, "every avatar strategy failed; using gray tile");
                gray_tile()
            }
        };
        self.cache.insert(key, Arc::clone(&img));
        img
    }

    /// Forget the cached avatar for one expression (all variants); `None` means neutral.
    pub fn invalidate(&mut self, persona: &str, expression: Option<Expression>) -> usize {
        match expression {
            Some(e) if e != Expression::Neutral => self
                .cache
                .remove_prefix(&cache_key(persona, &format!("_{}", e.name()))),
            _ => usize::from(self.cache.remove(&cache_key(persona, ""))),
        }
    }

    /// Forget every cached avatar of `persona`.
    pub fn release_persona(&mut self, persona: &str) -> usize {
        self.cache.remove_prefix(&cache_key(persona, ""))
    }

    /// Forget every cached avatar.
    pub fn clear(&mut self) {
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

fn cache_key(persona: &str, suffix: &str) -> String {
    format!("{persona}_avatar_{suffix}")
}

// Last resort if even the placeholder strategy is missing or fails.
fn gray_tile() -> Arc<ImageBuffer> {
    Arc::new(ImageBuffer::single_pixel(Rgb8::GRAY.to_rgba8()))
}

#[cfg(test)]
#[path = "../../tests/unit/avatar/resolver.rs"]
mod tests;
