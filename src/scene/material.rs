use crate::error::{Result, TracerError};

// queried once per entity at spawn time
pub trait MaterialSource {
    // sRGB, alpha ignored
    fn base_color(&self) -> [f32; 4];
    fn metallic(&self) -> f32;
    fn glossiness(&self) -> f32;
    fn emission_color(&self) -> [f32; 3];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub glossiness: f32,
    pub emission_color: [f32; 3],
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            glossiness: 0.5,
            emission_color: [0.0; 3],
        }
    }
}

impl SurfaceMaterial {
    pub fn new(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic;
        self
    }

    #[must_use]
    pub fn glossiness(mut self, glossiness: f32) -> Self {
        self.glossiness = glossiness;
        self
    }

    #[must_use]
    pub fn emission(mut self, color: [f32; 3]) -> Self {
        self.emission_color = color;
        self
    }
}

impl MaterialSource for SurfaceMaterial {
    fn base_color(&self) -> [f32; 4] {
        self.base_color
    }

    fn metallic(&self) -> f32 {
        self.metallic
    }

    fn glossiness(&self) -> f32 {
        self.glossiness
    }

    fn emission_color(&self) -> [f32; 3] {
        self.emission_color
    }
}

// 0 is reserved for "no material"
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialType {
    Lambertian = 1,
    Metal = 2,
    Dielectric = 3,
    Emissive = 4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadingModel {
    Lambertian,
    Metal,
    Dielectric { index_of_refraction: f32 },
    Emissive { power: f32 },
}

impl ShadingModel {
    pub const DEFAULT_IOR: f32 = 1.5;
    pub const DEFAULT_EMISSION_POWER: f32 = 1.0;

    #[must_use]
    pub fn glass() -> Self {
        Self::Dielectric {
            index_of_refraction: Self::DEFAULT_IOR,
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self::Emissive {
            power: Self::DEFAULT_EMISSION_POWER,
        }
    }

    #[must_use]
    pub fn material_type(&self) -> MaterialType {
        match self {
            Self::Lambertian => MaterialType::Lambertian,
            Self::Metal => MaterialType::Metal,
            Self::Dielectric { .. } => MaterialType::Dielectric,
            Self::Emissive { .. } => MaterialType::Emissive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectProperties {
    pub shading: ShadingModel,
    // above 1 gives over-bright surfaces
    pub colour_multiplier: f32,
}

impl Default for ObjectProperties {
    fn default() -> Self {
        Self {
            shading: ShadingModel::Lambertian,
            colour_multiplier: 1.0,
        }
    }
}

impl ObjectProperties {
    pub fn new(shading: ShadingModel) -> Self {
        Self {
            shading,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn colour_multiplier(mut self, multiplier: f32) -> Self {
        self.colour_multiplier = multiplier;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMaterial {
    pub material_type: MaterialType,
    pub albedo: [f32; 3],
    pub metallic: [f32; 3],
    pub smoothness: f32,
    pub index_of_refraction: f32,
    pub emission: [f32; 3],
    pub emission_power: f32,
}

// GPU material block (64 bytes), embedded in sphere and mesh-object records
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialRecord {
    pub albedo: [f32; 3],
    pub material_type: u32,
    pub metallic: [f32; 3],
    pub smoothness: f32,
    pub emission: [f32; 3],
    pub emission_power: f32,
    pub index_of_refraction: f32,
    pub _pad: [f32; 3],
}

impl ResolvedMaterial {
    #[must_use]
    pub fn to_record(&self) -> MaterialRecord {
        MaterialRecord {
            albedo: self.albedo,
            material_type: self.material_type as u32,
            metallic: self.metallic,
            smoothness: self.smoothness,
            emission: self.emission,
            emission_power: self.emission_power,
            index_of_refraction: self.index_of_refraction,
            _pad: [0.0; 3],
        }
    }
}

#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Combines a material source with object properties. Emission is zero for
/// every shading model except [`ShadingModel::Emissive`].
pub fn resolve(source: &dyn MaterialSource, properties: &ObjectProperties) -> Result<ResolvedMaterial> {
    let multiplier = properties.colour_multiplier;
    if !(multiplier >= 0.0) {
        return Err(TracerError::InvalidMaterial(format!(
            "colour multiplier must be non-negative, got {multiplier}"
        )));
    }

    let [r, g, b, _] = source.base_color();
    let albedo = [r, g, b].map(|c| srgb_to_linear(c) * multiplier);
    let metallic = source.metallic();

    let (index_of_refraction, emission, emission_power) = match properties.shading {
        ShadingModel::Dielectric { index_of_refraction } => (index_of_refraction, [0.0; 3], 0.0),
        ShadingModel::Emissive { power } => (1.0, source.emission_color(), power),
        ShadingModel::Lambertian | ShadingModel::Metal => (1.0, [0.0; 3], 0.0),
    };

    Ok(ResolvedMaterial {
        material_type: properties.shading.material_type(),
        albedo,
        metallic: [metallic; 3],
        smoothness: source.glossiness(),
        index_of_refraction,
        emission,
        emission_power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_64_bytes() {
        assert_eq!(std::mem::size_of::<MaterialRecord>(), 64);
    }

    #[test]
    fn albedo_is_linearised_and_scaled() {
        let source = SurfaceMaterial::new([1.0, 0.5, 0.0, 1.0]);
        let props = ObjectProperties::default().colour_multiplier(2.0);
        let resolved = resolve(&source, &props).unwrap();
        assert!((resolved.albedo[0] - 2.0).abs() < 1e-6);
        assert!((resolved.albedo[1] - 2.0 * srgb_to_linear(0.5)).abs() < 1e-6);
        assert_eq!(resolved.albedo[2], 0.0);
    }

    #[test]
    fn metallic_is_broadcast() {
        let source = SurfaceMaterial::default().metallic(0.7).glossiness(0.9);
        let resolved = resolve(&source, &ObjectProperties::new(ShadingModel::Metal)).unwrap();
        assert_eq!(resolved.metallic, [0.7; 3]);
        assert_eq!(resolved.smoothness, 0.9);
        assert_eq!(resolved.material_type, MaterialType::Metal);
    }

    #[test]
    fn emission_is_dropped_unless_emissive() {
        let source = SurfaceMaterial::default().emission([4.0, 2.0, 1.0]);

        let lambert = resolve(&source, &ObjectProperties::default()).unwrap();
        assert_eq!(lambert.emission, [0.0; 3]);
        assert_eq!(lambert.emission_power, 0.0);

        let light = resolve(&source, &ObjectProperties::new(ShadingModel::Emissive { power: 3.0 })).unwrap();
        assert_eq!(light.emission, [4.0, 2.0, 1.0]);
        assert_eq!(light.emission_power, 3.0);
    }

    #[test]
    fn dielectric_carries_ior() {
        let resolved = resolve(&SurfaceMaterial::default(), &ObjectProperties::new(ShadingModel::glass())).unwrap();
        assert_eq!(resolved.index_of_refraction, 1.5);
        assert_eq!(resolved.to_record().material_type, 3);
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let props = ObjectProperties::default().colour_multiplier(-1.0);
        assert!(resolve(&SurfaceMaterial::default(), &props).is_err());
    }
}
