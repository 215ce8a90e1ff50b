//! Asset cache: decoded artwork, loaded once and shared.
//!
//! DESIGN
//! ======
//! Three keyed caches: raw decoded images, base maps scaled for the canvas,
//! and circular token bitmaps at a given diameter. Each entry is a
//! `OnceCell` slot cloned out of the map before initialization, so two
//! concurrent first requests for the same key decode exactly once and share
//! the resulting `Arc`. A failed load leaves the slot empty; the next
//! request retries it.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::warn;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// Ring width of the border drawn around circular token bitmaps.
const TOKEN_BORDER_WIDTH: f64 = 2.0;
const TOKEN_BORDER: Rgba<u8> = Rgba([0, 0, 0, 255]);

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {}", path.display(), source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {}", path.display(), source)]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("path escapes the asset directory: {0}")]
    PathEscape(String),
}

// =============================================================================
// CACHE
// =============================================================================

type Slot = Arc<OnceCell<Arc<RgbaImage>>>;

#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    /// Decoded source images keyed by path.
    raw: Mutex<HashMap<PathBuf, Slot>>,
    /// Base maps resized for the canvas, keyed by (path, width, height).
    scaled: Mutex<HashMap<(PathBuf, u32, u32), Slot>>,
    /// Circular token bitmaps keyed by (path, diameter).
    circles: Mutex<HashMap<(PathBuf, u32), Slot>>,
}

impl AssetCache {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(CacheInner::default()) }
    }

    /// Decoded source image at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing file, `Read` for other I/O
    /// failures, `Decode` for unreadable image data.
    pub async fn raw_image(&self, path: &Path) -> Result<Arc<RgbaImage>, AssetError> {
        let slot = lock(&self.inner.raw).entry(path.to_path_buf()).or_default().clone();
        slot.get_or_try_init(|| load_raw(path)).await.cloned()
    }

    /// Source image at `path` resized to exactly `width` x `height`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AssetCache::raw_image`].
    pub async fn base_scaled(
        &self,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<Arc<RgbaImage>, AssetError> {
        let width = width.max(1);
        let height = height.max(1);
        let key = (path.to_path_buf(), width, height);
        let slot = lock(&self.inner.scaled).entry(key).or_default().clone();
        slot.get_or_try_init(|| async {
            let raw = self.raw_image(path).await?;
            Ok(Arc::new(image::imageops::resize(raw.as_ref(), width, height, FilterType::Triangle)))
        })
        .await
        .cloned()
    }

    /// Circular token bitmap at `diameter`: source art scaled square, masked
    /// to a circle, with a border ring.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AssetCache::raw_image`].
    pub async fn token_circle(&self, path: &Path, diameter: u32) -> Result<Arc<RgbaImage>, AssetError> {
        let diameter = diameter.max(1);
        let key = (path.to_path_buf(), diameter);
        let slot = lock(&self.inner.circles).entry(key).or_default().clone();
        slot.get_or_try_init(|| async {
            let raw = self.raw_image(path).await?;
            Ok(Arc::new(circular_token(raw.as_ref(), diameter)))
        })
        .await
        .cloned()
    }

    /// Insert a pre-decoded source image, bypassing the filesystem.
    #[cfg(test)]
    pub(crate) fn seed(&self, path: &Path, image: RgbaImage) {
        let slot: Slot = Arc::new(OnceCell::new_with(Some(Arc::new(image))));
        lock(&self.inner.raw).insert(path.to_path_buf(), slot);
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn load_raw(path: &Path) -> Result<Arc<RgbaImage>, AssetError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound(path.to_path_buf())
        } else {
            AssetError::Read { path: path.to_path_buf(), source }
        }
    })?;
    let image = image::load_from_memory(&bytes)
        .map_err(|source| AssetError::Decode { path: path.to_path_buf(), source })?;
    Ok(Arc::new(image.into_rgba8()))
}

/// Scale to a square of `diameter`, blank out everything beyond the circle,
/// and draw the border ring.
fn circular_token(source: &RgbaImage, diameter: u32) -> RgbaImage {
    let scaled = image::imageops::resize(source, diameter, diameter, FilterType::Triangle);
    let mut out = RgbaImage::new(diameter, diameter);
    let center = f64::from(diameter) / 2.0;
    let radius = center;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - center;
        let dy = f64::from(y) + 0.5 - center;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= radius - TOKEN_BORDER_WIDTH {
            *pixel = *scaled.get_pixel(x, y);
        } else if dist <= radius {
            *pixel = TOKEN_BORDER;
        }
    }
    out
}

// =============================================================================
// INVENTORY
// =============================================================================

/// An available token image on disk.
#[derive(Debug, Clone, Serialize)]
pub struct TokenImage {
    /// Display name: the file stem.
    pub name: String,
    /// Path relative to the tokens directory, as accepted by the add and
    /// artwork endpoints.
    pub path: String,
}

/// Token images directly inside `dir`, sorted by file name.
#[must_use]
pub fn list_inventory(dir: &Path) -> Vec<TokenImage> {
    image_files(dir)
        .into_iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?.to_string();
            let name = path.file_stem()?.to_str()?.to_string();
            Some(TokenImage { name, path: file_name })
        })
        .collect()
}

/// Paths of image files directly inside `dir`, sorted by file name.
#[must_use]
pub fn image_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "asset directory not readable");
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    files.sort();
    files
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

// =============================================================================
// PATH RESOLUTION
// =============================================================================

/// Resolve a client-supplied relative path against an asset root.
///
/// # Errors
///
/// Returns `PathEscape` for empty, absolute, or traversing paths.
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf, AssetError> {
    let rel = Path::new(relative);
    let safe = !relative.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(AssetError::PathEscape(relative.to_string()));
    }
    Ok(root.join(rel))
}

/// Content type for an image path, by extension.
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;
