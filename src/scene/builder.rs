//! Flattening of registered entities into the kernel's wire records.

use glam::Mat4;

use super::material::{MaterialRecord, ResolvedMaterial};
use super::SceneContext;
use crate::geometry::Mesh;

// Sphere record (80 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereRecord {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: MaterialRecord,
}

// Mesh-object record (144 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshObjectRecord {
    pub local_to_world: [[f32; 4]; 4],
    pub indices_offset: u32,
    pub indices_count: u32,
    pub _pad: [u32; 2],
    pub material: MaterialRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SphereBatch {
    pub version: u64,
    pub spheres: Vec<SphereRecord>,
}

impl SphereBatch {
    #[must_use]
    pub fn build(scene: &SceneContext, version: u64) -> Self {
        let spheres = scene
            .active_spheres()
            .map(|(_, entity)| SphereRecord {
                center: entity.transform.world_position().to_array(),
                // X scale is authoritative, the sphere primitive has unit diameter
                radius: entity.transform.scale.x / 2.0,
                material: entity.material().to_record(),
            })
            .collect();

        Self { version, spheres }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBatch {
    pub version: u64,
    pub objects: Vec<MeshObjectRecord>,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshBatch {
    #[must_use]
    pub fn build(scene: &SceneContext, version: u64) -> Self {
        let mut builder = MeshBatchBuilder::new();
        for (_, entity, mesh) in scene.active_mesh_objects() {
            builder.add_mesh_object(mesh, entity.transform.local_to_world(), entity.material());
        }
        builder.build(version)
    }

    // index ranges inside the index pool, indices inside the vertex pool
    #[must_use]
    pub fn validate(&self) -> bool {
        let ranges_ok = self.objects.iter().all(|o| {
            (o.indices_offset as usize + o.indices_count as usize) <= self.indices.len()
        });
        let indices_ok = self
            .indices
            .iter()
            .all(|&i| (i as usize) < self.vertices.len());
        ranges_ok && indices_ok
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Appends every mesh's vertices to one pool and rebases its indices by the
/// mesh's first-vertex offset.
#[derive(Debug, Default)]
pub struct MeshBatchBuilder {
    objects: Vec<MeshObjectRecord>,
    vertices: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl MeshBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh_object(
        &mut self,
        mesh: &Mesh,
        local_to_world: Mat4,
        material: &ResolvedMaterial,
    ) -> u32 {
        let id = self.objects.len() as u32;

        let first_vertex = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;

        self.vertices.extend_from_slice(&mesh.positions);
        self.indices
            .extend(mesh.indices.iter().map(|&i| i + first_vertex));

        self.objects.push(MeshObjectRecord {
            local_to_world: local_to_world.to_cols_array_2d(),
            indices_offset: first_index,
            indices_count: mesh.indices.len() as u32,
            _pad: [0; 2],
            material: material.to_record(),
        });

        id
    }

    #[must_use]
    pub fn build(self, version: u64) -> MeshBatch {
        let batch = MeshBatch {
            version,
            objects: self.objects,
            vertices: self.vertices,
            indices: self.indices,
        };
        debug_assert!(batch.validate());
        batch
    }
}
