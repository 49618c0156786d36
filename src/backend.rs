use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::camera::CameraPose;
use crate::quality::SkyboxFlags;

// kernel tile edge, the grid is ceil(w / 8) x ceil(h / 8) groups
pub const WORKGROUP_SIZE: u32 = 8;

// bits of KernelParams::bound_mask, one per scene buffer
pub mod bound {
    pub const SPHERES: u32 = 1 << 0;
    pub const MESH_OBJECTS: u32 = 1 << 1;
    pub const VERTICES: u32 = 1 << 2;
    pub const INDICES: u32 = 1 << 3;
}

// Kernel uniform block (160 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct KernelParams {
    pub camera_to_world: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    pub use_skybox_texture: u32,
    pub use_night_skybox: u32,
    pub use_vaporwave_skybox: u32,
    pub samples_per_pixel: u32,
    pub ray_bounce_limit: u32,
    pub random_seed: f32,
    // buffers without their bit are treated as empty by the kernel
    pub bound_mask: u32,
    pub _pad: u32,
}

impl KernelParams {
    #[must_use]
    pub fn new(
        camera: &CameraPose,
        skybox: SkyboxFlags,
        samples_per_pixel: u32,
        ray_bounce_limit: u32,
        random_seed: f32,
        bound_mask: u32,
    ) -> Self {
        Self {
            camera_to_world: camera.camera_to_world.to_cols_array_2d(),
            inverse_projection: camera.inverse_projection.to_cols_array_2d(),
            use_skybox_texture: u32::from(skybox.textured),
            use_night_skybox: u32::from(skybox.night),
            use_vaporwave_skybox: u32::from(skybox.vaporwave),
            samples_per_pixel,
            ray_bounce_limit,
            random_seed,
            bound_mask,
            _pad: 0,
        }
    }

    #[must_use]
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.camera_to_world)
    }
}

// None means not bound
#[derive(Debug)]
pub struct SceneBindings<'a, B> {
    pub spheres: Option<&'a B>,
    pub mesh_objects: Option<&'a B>,
    pub vertices: Option<&'a B>,
    pub indices: Option<&'a B>,
}

impl<B> Clone for SceneBindings<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for SceneBindings<'_, B> {}

impl<B> SceneBindings<'_, B> {
    #[must_use]
    pub fn bound_mask(&self) -> u32 {
        let mut mask = 0;
        if self.spheres.is_some() {
            mask |= bound::SPHERES;
        }
        if self.mesh_objects.is_some() {
            mask |= bound::MESH_OBJECTS;
        }
        if self.vertices.is_some() {
            mask |= bound::VERTICES;
        }
        if self.indices.is_some() {
            mask |= bound::INDICES;
        }
        mask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    Denoise,
    Copy,
}

#[must_use]
pub fn dispatch_groups(width: u32, height: u32) -> [u32; 2] {
    [width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE)]
}

/// GPU-side operations the frame loop needs. Every `release_*` consumes the
/// handle it frees, so each allocation can be released at most once.
pub trait GpuBackend {
    type Buffer;
    type Target;

    // stride is the size of one element in bytes
    fn create_storage_buffer(&mut self, label: &str, contents: &[u8], stride: u32) -> Self::Buffer;

    fn write_storage_buffer(&mut self, buffer: &Self::Buffer, contents: &[u8]);

    fn release_storage_buffer(&mut self, buffer: Self::Buffer);

    fn create_accumulation_target(&mut self, width: u32, height: u32) -> Self::Target;

    fn release_accumulation_target(&mut self, target: Self::Target);

    fn dispatch(
        &mut self,
        target: &Self::Target,
        params: &KernelParams,
        scene: SceneBindings<'_, Self::Buffer>,
        groups: [u32; 2],
    );

    fn composite(&mut self, target: &Self::Target, mode: CompositeMode, sample_count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_is_160_bytes() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 160);
    }

    #[test]
    fn groups_round_up() {
        assert_eq!(dispatch_groups(1280, 720), [160, 90]);
        assert_eq!(dispatch_groups(1281, 1), [161, 1]);
        assert_eq!(dispatch_groups(7, 9), [1, 2]);
    }

    #[test]
    fn bound_mask_tracks_present_buffers() {
        let buf = 0u8;
        let bindings = SceneBindings {
            spheres: Some(&buf),
            mesh_objects: None,
            vertices: Some(&buf),
            indices: None,
        };
        assert_eq!(bindings.bound_mask(), bound::SPHERES | bound::VERTICES);
    }
}
