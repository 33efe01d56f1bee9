use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;

use crate::assets::decode::decode_image;
use crate::foundation::error::{VisageError, VisageResult};
use crate::raster::buffer::ImageBuffer;

/// Resolves logical asset paths (`{category}/{persona}/{name}`) to images.
///
/// Lookups are exact-match; a miss is an expected outcome, not an error.
pub trait AssetLookup {
    /// Return the image stored under `path`, if any.
    fn lookup(&self, path: &str) -> Option<Arc<ImageBuffer>>;
}

/// Build the logical path `{category}/{persona}/{name}`.
pub fn asset_path(category: &str, persona: &str, name: &str) -> String {
    let category = category.trim_end_matches('/');
    if category.is_empty() {
        format!("{persona}/{name}")
    } else {
        format!("{category}/{persona}/{name}")
    }
}

/// Normalize and validate a relative logical path.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> VisageResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(VisageError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(VisageError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(VisageError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(VisageError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// In-memory exact-path asset store.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetStore {
    images: HashMap<String, Arc<ImageBuffer>>,
}

impl MemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `img` under `path`, replacing any previous image.
    pub fn insert(&mut self, path: impl Into<String>, img: ImageBuffer) {
        self.images.insert(path.into(), Arc::new(img));
    }

    /// Remove the image under `path`.
    pub fn remove(&mut self, path: &str) -> bool {
        self.images.remove(path).is_some()
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetLookup for MemoryAssetStore {
    fn lookup(&self, path: &str) -> Option<Arc<ImageBuffer>> {
        self.images.get(path).cloned()
    }
}

const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

#[derive(Default)]
struct DirState {
    resolved: HashMap<String, Option<Arc<ImageBuffer>>>,
    decode_counts: HashMap<String, u32>,
}

/// Filesystem-backed asset store rooted at a directory.
///
/// A logical path `a/b/name` resolves to `<root>/a/b/name.<ext>` for the first existing
/// extension. Results (including misses) are memoized until [`DirAssetStore::reload`].
pub struct DirAssetStore {
    root: PathBuf,
    extensions: Vec<String>,
    state: Mutex<DirState>,
}

impl std::fmt::Debug for DirAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirAssetStore")
            .field("root", &self.root)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl DirAssetStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            state: Mutex::new(DirState::default()),
        }
    }

    /// Override the probed file extensions (in priority order).
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Forget memoized lookups so changed files are picked up.
    pub fn reload(&self) {
        let mut st = self.lock();
        st.resolved.clear();
    }

    /// How many times the file behind `path` was decoded.
    pub fn decode_count(&self, path: &str) -> u32 {
        let Ok(norm) = normalize_rel_path(path) else {
            return 0;
        };
        self.lock().decode_counts.get(&norm).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, DirState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, norm: &str) -> VisageResult<Option<ImageBuffer>> {
        for ext in &self.extensions {
            let file = self.root.join(format!("{norm}.{ext}"));
            if !file.is_file() {
                continue;
            }
            let bytes =
                std::fs::read(&file).with_context(|| format!("read asset '{}'", file.display()))?;
            return decode_image(&bytes).map(Some);
        }
        Ok(None)
    }
}

impl AssetLookup for DirAssetStore {
    fn lookup(&self, path: &str) -> Option<Arc<ImageBuffer>> {
        let norm = match normalize_rel_path(path) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(path, error = %e, "rejected asset path");
                return None;
            }
        };

        if let Some(hit) = self.lock().resolved.get(&norm) {
            return hit.clone();
        }

        let loaded = match self.load(&norm) {
            Ok(Some(img)) => {
                let mut st = self.lock();
                *st.decode_counts.entry(norm.clone()).or_insert(0) += 1;
                Some(Arc::new(img))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(path = %norm, error = %e, "asset failed to load");
                None
            }
        };

        self.lock().resolved.insert(norm, loaded.clone());
        loaded
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/lookup.rs"]
mod tests;
