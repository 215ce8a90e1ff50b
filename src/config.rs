//! Runtime configuration.
//!
//! DESIGN
//! ======
//! Every knob is an environment variable with a default, so the binary runs
//! out of the box against `assets/maps` and `assets/tokens` in the working
//! directory. `PORT=0` asks the OS for a free port; the bound address is
//! logged at startup.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CANVAS_WIDTH: u32 = 1280;
const DEFAULT_CANVAS_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 15;
const DEFAULT_JPEG_QUALITY: u8 = 80;
const DEFAULT_GRID_SIZE: u32 = 50;
const DEFAULT_MAPS_DIR: &str = "assets/maps";
const DEFAULT_TOKENS_DIR: &str = "assets/tokens";
const DEFAULT_STATIC_DIR: &str = "static";

/// Server and render-pipeline settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port for the HTTP server. `0` binds an OS-assigned free port.
    pub port: u16,
    /// Canvas width in pixels. Canvas space is the coordinate space for
    /// every token position, stroke point, and fog reveal.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Upper bound on rendered frames per second.
    pub target_fps: u32,
    /// JPEG quality for streamed frames, 1-100.
    pub jpeg_quality: u8,
    /// Grid cell size in pixels; also the token diameter.
    pub grid_size: u32,
    /// Whether new maps start with the grid overlay on.
    pub grid_enabled: bool,
    /// Directory scanned for battlemap images.
    pub maps_dir: PathBuf,
    /// Directory scanned for token artwork.
    pub tokens_dir: PathBuf,
    /// Directory of static viewer pages.
    pub static_dir: PathBuf,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            canvas_width: env_parse("CANVAS_WIDTH", DEFAULT_CANVAS_WIDTH),
            canvas_height: env_parse("CANVAS_HEIGHT", DEFAULT_CANVAS_HEIGHT),
            target_fps: env_parse("TARGET_FPS", DEFAULT_TARGET_FPS),
            jpeg_quality: env_parse("JPEG_QUALITY", DEFAULT_JPEG_QUALITY),
            grid_size: env_parse("GRID_SIZE", DEFAULT_GRID_SIZE),
            grid_enabled: env_parse("GRID_ENABLED", true),
            maps_dir: env_path("MAPS_DIR", DEFAULT_MAPS_DIR),
            tokens_dir: env_path("TOKENS_DIR", DEFAULT_TOKENS_DIR),
            static_dir: env_path("STATIC_DIR", DEFAULT_STATIC_DIR),
        }
    }

    /// Time between render ticks. A zero `target_fps` is treated as 1.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
