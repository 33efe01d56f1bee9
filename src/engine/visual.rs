use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::blink::{BlinkSystem, EyeState};
use crate::animation::breathing::BreathingSystem;
use crate::assets::lookup::AssetLookup;
use crate::avatar::resolver::AvatarResolver;
use crate::crop::smart::{CropPurpose, SmartCropper};
use crate::engine::config::EngineConfig;
use crate::expression::category::{Expression, validate_expression_tables};
use crate::expression::source::{ExpressionSource, StaticExpressionSource};
use crate::foundation::core::{Rect, Rgb8};
use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::ImageBuffer;
use crate::raster::readable::ReadableImage;
use crate::render::blend::crossfade_in_place;
use crate::render::cache::CacheStats;
use crate::render::layers::{LayerCompositor, LayerSelection};
use crate::render::region::{FaceRegion, FaceRegionTable, RegionCompositor};

/// A registered persona.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonaProfile {
    /// Persona id.
    pub id: String,
    /// Placeholder colour.
    pub primary_color: Rgb8,
}

/// Animation outputs for one persona and frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameState {
    /// Persona id.
    pub persona: String,
    /// Expression shown this frame.
    pub expression: Expression,
    /// Eyelid position.
    pub eye_state: EyeState,
    /// Eye layer name to composite.
    pub eye_layer: &'static str,
    /// `sin` blink curve while blinking, `1.0` otherwise.
    pub blink_alpha: f64,
    /// Weight of the closed/half-closed eye layer over the open eyes.
    pub closed_weight: f64,
    /// Interpolated breathing speed.
    pub breathing_speed: f64,
    /// Interpolated breathing amplitude.
    pub breathing_amplitude: f64,
    /// Breathing offset at the persona's clock.
    pub breathing_offset: f64,
    /// Human-readable breathing status.
    pub breathing_status: String,
}

/// Cache counters of every engine cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheReport {
    /// Layer composites.
    pub composite: CacheStats,
    /// Smart crops.
    pub crop: CacheStats,
    /// Avatars.
    pub avatar: CacheStats,
    /// Face-region blends.
    pub region: CacheStats,
}

impl CacheReport {
    /// Retained pixel memory across all caches in MiB.
    pub fn memory_mb(&self) -> f64 {
        let bytes = self.composite.retained_bytes
            + self.crop.retained_bytes
            + self.avatar.retained_bytes
            + self.region.retained_bytes;
        bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Owns every per-persona state machine and cache.
///
/// Call [`VisualEngine::tick`] once per frame before [`VisualEngine::render_frame`]; layer
/// selection for a frame depends on the state the tick produced.
pub struct VisualEngine {
    config: EngineConfig,
    assets: Box<dyn AssetLookup>,
    expressions: Box<dyn ExpressionSource>,
    personas: HashMap<String, PersonaProfile>,
    last_expression: HashMap<String, Expression>,
    compositor: LayerCompositor,
    regions: RegionCompositor,
    face_regions: FaceRegionTable,
    cropper: SmartCropper,
    avatars: AvatarResolver,
    blink: BlinkSystem,
    breathing: BreathingSystem,
}

impl std::fmt::Debug for VisualEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualEngine")
            .field("config", &self.config)
            .field("personas", &self.personas.len())
            .finish_non_exhaustive()
    }
}

impl VisualEngine {
    /// Build an engine over `assets`, registering the personas listed in `config`.
    pub fn new(config: EngineConfig, assets: Box<dyn AssetLookup>) -> VisageResult<Self> {
        validate_expression_tables()?;
        config.validate()?;

        let budget = config.cache;
        let mut engine = Self {
            compositor: LayerCompositor::new(
                config.layered_base_path.clone(),
                config.composite_path,
                config.parallel_blend,
                budget,
            ),
            regions: RegionCompositor::new(budget),
            face_regions: config.face_regions.clone(),
            cropper: SmartCropper::new(budget),
            avatars: AvatarResolver::new(config.avatar_base_path.clone(), budget),
            blink: BlinkSystem::new(config.seed),
            breathing: BreathingSystem::new(),
            assets,
            expressions: Box::new(StaticExpressionSource::new()),
            personas: HashMap::new(),
            last_expression: HashMap::new(),
            config,
        };

        let startup: Vec<_> = engine
            .config
            .personas
            .iter()
            .map(|p| (p.id.clone(), p.primary_color))
            .collect();
        for (id, color) in startup {
            engine.register_persona(&id, color)?;
        }
        tracing::info!(
            personas = engine.personas.len(),
            path = ?engine.config.composite_path,
            "visual engine ready"
        );
        Ok(engine)
    }

    /// Replace the expression collaborator used for avatar file suffixes.
    pub fn with_expression_source(mut self, source: Box<dyn ExpressionSource>) -> Self {
        self.expressions = source;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a persona (or update its colour).
    pub fn register_persona(&mut self, id: &str, primary_color: Rgb8) -> VisageResult<()> {
        if id.trim().is_empty() || id.contains('/') {
            return Err(VisageError::validation(format!(
                "persona id '{id}' must be non-empty and contain no '/'"
            )));
        }
        self.personas.insert(
            id.to_owned(),
            PersonaProfile {
                id: id.to_owned(),
                primary_color,
            },
        );
        if self.breathing.snapshot(id).is_none() {
            self.breathing.sync_with_expression(id, Expression::Neutral);
        }
        tracing::debug!(persona = id, "persona registered");
        Ok(())
    }

    /// Drop a persona's state machines and cached images.
    pub fn release_persona(&mut self, id: &str) -> bool {
        let known = self.personas.remove(id).is_some();
        self.last_expression.remove(id);
        self.blink.clear(id);
        self.breathing.clear(id);
        let composites = self.compositor.release_persona(id);
        let avatars = self.avatars.release_persona(id);
        let blends = self.regions.invalidate_prefix(&format!("{id}|"));
        tracing::debug!(persona = id, composites, avatars, blends, "persona released");
        known
    }

    /// Whether `id` is registered.
    pub fn is_registered(&self, id: &str) -> bool {
        self.personas.contains_key(id)
    }

    /// Registered persona ids, sorted.
    pub fn personas(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.personas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Advance `persona`'s blink and breathing state by `dt` seconds.
    pub fn tick(&mut self, persona: &str, expression: Expression, dt: f64) -> VisageResult<FrameState> {
        if !self.is_registered(persona) {
            return Err(VisageError::validation(format!(
                "persona '{persona}' is not registered"
            )));
        }

        if self.last_expression.get(persona) != Some(&expression) {
            self.breathing.sync_with_expression(persona, expression);
            self.last_expression.insert(persona.to_owned(), expression);
        }
        let eye_state = self.blink.update(persona, expression, dt);
        self.breathing.update(persona, dt);

        let breath = self.breathing.snapshot(persona);
        Ok(FrameState {
            persona: persona.to_owned(),
            expression,
            eye_state,
            eye_layer: eye_state.layer_name(expression),
            blink_alpha: self.blink.blink_alpha(persona),
            closed_weight: self.blink.closed_weight(persona),
            breathing_speed: breath.map_or(0.0, |b| b.speed),
            breathing_amplitude: breath.map_or(0.0, |b| b.amplitude),
            breathing_offset: self.breathing.offset(persona),
            breathing_status: self.breathing.status(persona),
        })
    }

    /// Full composite without blink overrides.
    pub fn portrait(
        &mut self,
        persona: &str,
        expression: Expression,
        outfit: &str,
    ) -> Option<Arc<ImageBuffer>> {
        self.compositor
            .composite(self.assets.as_ref(), persona, expression, outfit)
    }

    /// Composite with explicit eye/mouth layer overrides (blink layers, visemes).
    pub fn portrait_with(
        &mut self,
        persona: &str,
        expression: Expression,
        outfit: &str,
        selection: &LayerSelection,
    ) -> Option<Arc<ImageBuffer>> {
        self.compositor
            .composite_with(self.assets.as_ref(), persona, expression, outfit, selection)
    }

    /// Composite for the current frame: the open-eyes portrait crossfaded toward the blink
    /// layer by the blink weight from the last [`VisualEngine::tick`].
    pub fn render_frame(
        &mut self,
        persona: &str,
        expression: Expression,
        outfit: &str,
    ) -> Option<Arc<ImageBuffer>> {
        let open = self.portrait(persona, expression, outfit)?;
        let weight = self.blink.closed_weight(persona);
        let state = self.blink.eye_state(persona);
        if weight <= 0.0 || state == EyeState::Open {
            return Some(open);
        }

        let eyes = LayerSelection::eyes(state.layer_name(expression));
        let Some(closed) = self.portrait_with(persona, expression, outfit, &eyes) else {
            return Some(open);
        };
        if weight >= 1.0 {
            return Some(closed);
        }

        match crossfade(&open, &closed, weight) {
            Ok(img) => Some(Arc::new(img)),
            Err(e) => {
                tracing::warn!(persona, error = %e, "blink crossfade failed; showing open eyes");
                Some(open)
            }
        }
    }

    /// Avatar image; never fails.
    pub fn avatar(&mut self, persona: &str, expression: Option<Expression>) -> Arc<ImageBuffer> {
        let color = self
            .personas
            .get(persona)
            .map_or(Rgb8::GRAY, |p| p.primary_color);
        self.avatars.resolve(
            self.assets.as_ref(),
            &mut self.compositor,
            self.expressions.as_ref(),
            persona,
            expression,
            color,
        )
    }

    /// Blend a face patch into `base` at `persona`'s face region.
    pub fn blend_face(
        &mut self,
        persona: &str,
        base: &Arc<ImageBuffer>,
        patch: &Arc<ImageBuffer>,
        cache_key: Option<&str>,
    ) -> Arc<ImageBuffer> {
        let region = self.face_regions.get(persona);
        let key = cache_key.map(|k| format!("{persona}|{k}"));
        self.regions.blend_region(
            &mut self.cropper,
            base,
            patch,
            &region,
            key.as_deref(),
            true,
        )
    }

    /// Face region used for `persona`.
    pub fn face_region(&self, persona: &str) -> FaceRegion {
        self.face_regions.get(persona)
    }

    /// Override `persona`'s face region and drop its cached blends.
    pub fn set_face_region(&mut self, persona: &str, region: FaceRegion) -> VisageResult<()> {
        self.face_regions.set(persona, region)?;
        self.regions.invalidate_prefix(&format!("{persona}|"));
        Ok(())
    }

    /// Crop through the shared cropper.
    pub fn crop(
        &mut self,
        source: &Arc<ImageBuffer>,
        purpose: CropPurpose,
        custom: Option<Rect>,
    ) -> Option<Arc<ImageBuffer>> {
        self.cropper.crop(source, purpose, custom)
    }

    /// Crop using the brightness-profile rectangle.
    pub fn crop_smart(
        &mut self,
        source: &Arc<ImageBuffer>,
        purpose: CropPurpose,
    ) -> Option<Arc<ImageBuffer>> {
        self.cropper.crop_smart(source, purpose)
    }

    /// Warm the composite cache for every expression.
    pub fn preload_all(&mut self, persona: &str, outfit: &str) -> usize {
        self.compositor
            .preload_all(self.assets.as_ref(), persona, outfit)
    }

    /// Drop cached portraits of one `(persona, expression)`.
    pub fn clear_portrait_cache(&mut self, persona: &str, expression: Expression) -> usize {
        self.compositor.clear_cache(persona, expression)
    }

    /// Drop a cached avatar after its assets changed.
    pub fn invalidate_avatar(&mut self, persona: &str, expression: Option<Expression>) -> usize {
        self.avatars.invalidate(persona, expression)
    }

    /// Drop every cached image.
    pub fn clear_all_caches(&mut self) {
        self.compositor.clear_all();
        self.cropper.clear_cache();
        self.avatars.clear();
        self.regions.clear_cache();
        tracing::info!("all image caches cleared");
    }

    /// Apply a new budget to every cache.
    pub fn set_cache_budget(&mut self, budget: crate::render::cache::CacheBudget) {
        self.config.cache = budget;
        self.compositor.set_budget(budget);
        self.cropper.set_budget(budget);
        self.avatars.set_budget(budget);
        self.regions.set_budget(budget);
    }

    /// Counters of every cache.
    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            composite: self.compositor.cache_stats(),
            crop: self.cropper.cache_stats(),
            avatar: self.avatars.cache_stats(),
            region: self.regions.cache_stats(),
        }
    }

    /// Blink state machines.
    pub fn blink(&self) -> &BlinkSystem {
        &self.blink
    }

    /// Mutable blink state machines (force blink, drowsy mode, interval override).
    pub fn blink_mut(&mut self) -> &mut BlinkSystem {
        &mut self.blink
    }

    /// Breathing state machines.
    pub fn breathing(&self) -> &BreathingSystem {
        &self.breathing
    }

    /// Mutable breathing state machines (explicit mode requests).
    pub fn breathing_mut(&mut self) -> &mut BreathingSystem {
        &mut self.breathing
    }
}

fn crossfade(open: &Arc<ImageBuffer>, closed: &Arc<ImageBuffer>, weight: f64) -> VisageResult<ImageBuffer> {
    let open = ReadableImage::ensure(open)?;
    let closed = ReadableImage::ensure(closed)?;
    if (open.width(), open.height()) != (closed.width(), closed.height()) {
        return Err(VisageError::dimension_mismatch(format!(
            "open {}x{} vs closed {}x{}",
            open.width(),
            open.height(),
            closed.width(),
            closed.height()
        )));
    }
    let mut out = ImageBuffer::clone(&open);
    crossfade_in_place(out.storage_mut(), closed.storage(), weight as f32)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/visual.rs"]
mod tests;
