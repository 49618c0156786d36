use serde::Deserialize;

pub const MAX_SAMPLES_PER_PIXEL: u32 = 20;
pub const MAX_RAY_BOUNCE_LIMIT: u32 = 20;

/// An integer parameter confined to `[1, max]`. Adjustments past either edge
/// return `false` and leave the value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedParam {
    value: u32,
    max: u32,
}

impl BoundedParam {
    pub const MIN: u32 = 1;

    #[must_use]
    pub fn new(value: u32, max: u32) -> Self {
        debug_assert!(max >= Self::MIN);
        Self {
            value: value.clamp(Self::MIN, max),
            max,
        }
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[inline]
    #[must_use]
    pub fn can_increment(&self) -> bool {
        self.value < self.max
    }

    #[inline]
    #[must_use]
    pub fn can_decrement(&self) -> bool {
        self.value > Self::MIN
    }

    pub fn increment(&mut self) -> bool {
        if !self.can_increment() {
            return false;
        }
        self.value += 1;
        true
    }

    pub fn decrement(&mut self) -> bool {
        if !self.can_decrement() {
            return false;
        }
        self.value -= 1;
        true
    }
}

// exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkyboxMode {
    // white to blue
    #[default]
    Standard,
    Vaporwave,
    Night,
    Textured,
}

// Standard is all three off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkyboxFlags {
    pub textured: bool,
    pub night: bool,
    pub vaporwave: bool,
}

impl SkyboxMode {
    #[must_use]
    pub fn flags(self) -> SkyboxFlags {
        SkyboxFlags {
            textured: self == Self::Textured,
            night: self == Self::Night,
            vaporwave: self == Self::Vaporwave,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityController {
    samples_per_pixel: BoundedParam,
    ray_bounce_limit: BoundedParam,
    skybox: SkyboxMode,
    denoise: bool,
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(8, 8, SkyboxMode::Standard, true)
    }
}

impl QualityController {
    #[must_use]
    pub fn new(samples_per_pixel: u32, ray_bounce_limit: u32, skybox: SkyboxMode, denoise: bool) -> Self {
        Self {
            samples_per_pixel: BoundedParam::new(samples_per_pixel, MAX_SAMPLES_PER_PIXEL),
            ray_bounce_limit: BoundedParam::new(ray_bounce_limit, MAX_RAY_BOUNCE_LIMIT),
            skybox,
            denoise,
        }
    }

    #[must_use]
    pub fn samples_per_pixel(&self) -> BoundedParam {
        self.samples_per_pixel
    }

    #[must_use]
    pub fn ray_bounce_limit(&self) -> BoundedParam {
        self.ray_bounce_limit
    }

    #[must_use]
    pub fn skybox(&self) -> SkyboxMode {
        self.skybox
    }

    #[must_use]
    pub fn denoise(&self) -> bool {
        self.denoise
    }

    pub fn increment_samples_per_pixel(&mut self) -> bool {
        self.samples_per_pixel.increment()
    }

    pub fn decrement_samples_per_pixel(&mut self) -> bool {
        self.samples_per_pixel.decrement()
    }

    pub fn increment_ray_bounce_limit(&mut self) -> bool {
        self.ray_bounce_limit.increment()
    }

    pub fn decrement_ray_bounce_limit(&mut self) -> bool {
        self.ray_bounce_limit.decrement()
    }

    // selecting the active mode again still counts as a change
    pub fn select_skybox(&mut self, mode: SkyboxMode) {
        self.skybox = mode;
    }

    pub fn set_denoise(&mut self, enabled: bool) -> bool {
        let changed = self.denoise != enabled;
        self.denoise = enabled;
        changed
    }
}
