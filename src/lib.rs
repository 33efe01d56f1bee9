//! Visage is a layered portrait compositing and animation engine for personas.
//!
//! Independently authored layers (background, body, hair, eyes, mouth, outfit) are resolved
//! from an asset store and composited back-to-front with straight-alpha source-over. Two
//! secondary animations run per persona and feed layer selection each frame: a timer-driven
//! blink cycle and mode-based breathing transitions.
//!
//! # Pipeline overview
//!
//! 1. **Tick**: `VisualEngine::tick(persona, expression, dt)` advances blink and breathing
//!    state and returns a [`FrameState`].
//! 2. **Composite**: [`LayerCompositor`] resolves `{category}/{persona}/{layer}` assets and
//!    blends them, either per pixel ([`CompositePath::Cpu`]) or with blits into a
//!    [`RenderTarget`] ([`CompositePath::Gpu`]). Both paths produce identical pixels.
//! 3. **Frame**: `VisualEngine::render_frame` crossfades the open-eyes portrait toward the
//!    blink layer by the blink weight.
//! 4. **Avatars** (independent): [`AvatarResolver`] walks an ordered strategy list ending in a
//!    generated placeholder, so an avatar request always yields an image.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single owner**: all per-persona state and caches live in one [`VisualEngine`]; nothing
//!   is process-global.
//! - **Best-effort imaging**: public compositing, cropping and blending operations never
//!   return errors; they log and fall back to `None`, the unchanged input, or a placeholder.
//! - **Straight RGBA8** with a top-left origin everywhere.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod avatar;
mod crop;
mod engine;
mod expression;
mod foundation;
mod raster;
mod render;

pub use animation::blink::{BLINK_DURATION, BlinkSystem, CLOSED_EYES, EyeState, HALF_CLOSED_EYES};
pub use animation::breathing::{
    BreathingMode, BreathingPreset, BreathingSnapshot, BreathingSystem, all_modes,
    breathing_offset,
};
pub use animation::rng::Rng64;
pub use assets::decode::{decode_image, encode_png};
pub use assets::lookup::{
    AssetLookup, DirAssetStore, MemoryAssetStore, asset_path, normalize_rel_path,
};
pub use avatar::placeholder::{PLACEHOLDER_SIZE, generate_placeholder};
pub use avatar::resolver::{
    AvatarContext, AvatarResolver, AvatarStrategy, BASE_AVATAR_NAMES, DEFAULT_STRATEGIES,
    base_asset, expression_asset, placeholder, portrait_crop,
};
pub use crop::smart::{
    CONTENT_THRESHOLD, CropPurpose, HEAD_CROP_MAX, SmartCropper, analyze_optimal_crop_rect,
    crop_head_square, pixel_rect,
};
pub use engine::config::{EngineConfig, PersonaConfig};
pub use engine::visual::{CacheReport, FrameState, PersonaProfile, VisualEngine};
pub use expression::category::{Expression, ExpressionTraits, validate_expression_tables};
pub use expression::source::{ExpressionSource, StaticExpressionSource};
pub use foundation::core::{
    PixelRect, Point, Rect, Rgb8, Rgba8, Size, TRANSPARENT, is_non_degenerate, norm_rect,
};
pub use foundation::error::{VisageError, VisageResult};
pub use raster::buffer::{ImageBuffer, PixelAccess};
pub use raster::readable::ReadableImage;
pub use raster::target::RenderTarget;
pub use render::blend::{crossfade, lerp_px, over};
pub use render::cache::{CacheBudget, CacheStats, ImageCache};
pub use render::layers::{
    CompositePath, DEFAULT_OUTFIT, LayerCompositor, LayerNames, LayerSelection, layer_names,
};
pub use render::region::{
    DEFAULT_REGION_KEY, FULL_PORTRAIT_AREA_RATIO, FaceRegion, FaceRegionTable, RegionCompositor,
};
