//! Start-up configuration, read once from an optional JSON file:
//!
//! ```json
//! { "width": 1920, "height": 1080, "samples_per_pixel": 4, "skybox": "night" }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::quality::{SkyboxMode, MAX_RAY_BOUNCE_LIMIT, MAX_SAMPLES_PER_PIXEL};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TracerSettings {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub ray_bounce_limit: u32,
    pub skybox: SkyboxMode,
    pub denoise: bool,
    // seeds the per-frame kernel random stream
    pub seed: u64,
    // equirectangular, used by SkyboxMode::Textured
    pub skybox_texture: Option<PathBuf>,
    pub vsync: bool,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            samples_per_pixel: 8,
            ray_bounce_limit: 8,
            skybox: SkyboxMode::Standard,
            denoise: true,
            seed: 0x5eed_cafe,
            skybox_texture: None,
            vsync: true,
        }
    }
}

impl TracerSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading settings from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    // zero dimensions fall back to the defaults
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        let spp = self.samples_per_pixel.clamp(1, MAX_SAMPLES_PER_PIXEL);
        if spp != self.samples_per_pixel {
            log::warn!(
                "samples_per_pixel {} out of range, clamped to {spp}",
                self.samples_per_pixel
            );
            self.samples_per_pixel = spp;
        }

        let bounces = self.ray_bounce_limit.clamp(1, MAX_RAY_BOUNCE_LIMIT);
        if bounces != self.ray_bounce_limit {
            log::warn!(
                "ray_bounce_limit {} out of range, clamped to {bounces}",
                self.ray_bounce_limit
            );
            self.ray_bounce_limit = bounces;
        }

        if self.width == 0 || self.height == 0 {
            log::warn!(
                "Render size {}x{} is empty, using {}x{}",
                self.width,
                self.height,
                defaults.width,
                defaults.height
            );
            self.width = defaults.width;
            self.height = defaults.height;
        }

        self
    }
}
