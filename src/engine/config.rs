use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{VisageError, VisageResult};
use crate::render::cache::CacheBudget;
use crate::render::layers::CompositePath;
use crate::render::region::FaceRegionTable;

/// A persona registered at engine startup.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Persona id as used in asset paths.
    pub id: String,
    /// Placeholder colour.
    #[serde(default = "default_color")]
    pub primary_color: Rgb8,
}

fn default_color() -> Rgb8 {
    Rgb8::GRAY
}

/// Engine configuration, usually loaded from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `{category}` prefix of layer assets.
    pub layered_base_path: String,
    /// `{category}` prefix of avatar assets.
    pub avatar_base_path: String,
    /// Compositing path.
    pub composite_path: CompositePath,
    /// Blend layers with rayon on the CPU path.
    pub parallel_blend: bool,
    /// Budget applied to each image cache.
    pub cache: CacheBudget,
    /// Blink interval seed.
    pub seed: u64,
    /// Face regions per persona.
    pub face_regions: FaceRegionTable,
    /// Personas registered at startup.
    pub personas: Vec<PersonaConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layered_base_path: "layered".to_owned(),
            avatar_base_path: "avatars".to_owned(),
            composite_path: CompositePath::Cpu,
            parallel_blend: true,
            cache: CacheBudget::default(),
            seed: 0x5EED,
            face_regions: FaceRegionTable::default(),
            personas: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config from a reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> VisageResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| VisageError::config(format!("parse engine config JSON: {e}")))
    }

    /// Parse a JSON config from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> VisageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VisageError::config(format!("open engine config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check paths, regions, the cache budget and persona ids.
    pub fn validate(&self) -> VisageResult<()> {
        for (name, p) in [
            ("layered_base_path", &self.layered_base_path),
            ("avatar_base_path", &self.avatar_base_path),
        ] {
            if p.starts_with('/') || p.split('/').any(|seg| seg == "..") {
                return Err(VisageError::config(format!(
                    "{name} must be a relative path without '..', got '{p}'"
                )));
            }
        }
        self.face_regions.validate()?;
        if (self.cache.max_entries == 0) != (self.cache.max_bytes == 0) {
            return Err(VisageError::config(format!(
                "cache budget {:?} must set both limits to 0 to disable caching",
                self.cache
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for p in &self.personas {
            if p.id.trim().is_empty() || p.id.contains('/') {
                return Err(VisageError::config(format!(
                    "persona id '{}' must be non-empty and contain no '/'",
                    p.id
                )));
            }
            if !seen.insert(p.id.as_str()) {
                return Err(VisageError::config(format!("duplicate persona id '{}'", p.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
