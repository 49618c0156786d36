use std::sync::Arc;

use bytemuck::Pod;

use super::builder::{MeshBatch, SphereBatch};
use super::SceneContext;
use crate::backend::{GpuBackend, SceneBindings};

/// One storage buffer plus the count and stride it was allocated for. A
/// matching upload writes in place; an empty one releases the buffer.
pub struct BufferSlot<B: GpuBackend> {
    handle: Option<B::Buffer>,
    count: usize,
    stride: usize,
    allocations: u64,
    releases: u64,
}

impl<B: GpuBackend> Default for BufferSlot<B> {
    fn default() -> Self {
        Self {
            handle: None,
            count: 0,
            stride: 0,
            allocations: 0,
            releases: 0,
        }
    }
}

impl<B: GpuBackend> std::fmt::Debug for BufferSlot<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSlot")
            .field("bound", &self.handle.is_some())
            .field("count", &self.count)
            .field("stride", &self.stride)
            .field("allocations", &self.allocations)
            .field("releases", &self.releases)
            .finish()
    }
}

impl<B: GpuBackend> BufferSlot<B> {
    pub fn new() -> Self {
        Self::default()
    }

    // true if a new buffer was allocated
    pub fn upload<T: Pod>(&mut self, backend: &mut B, label: &str, data: &[T]) -> bool {
        let stride = std::mem::size_of::<T>();

        if data.is_empty() {
            self.release(backend);
            return false;
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);

        if let Some(handle) = &self.handle {
            if self.count == data.len() && self.stride == stride {
                backend.write_storage_buffer(handle, bytes);
                return false;
            }
        }

        self.release(backend);
        self.handle = Some(backend.create_storage_buffer(label, bytes, stride as u32));
        self.count = data.len();
        self.stride = stride;
        self.allocations += 1;
        log::trace!("Allocated {label}: {} x {} bytes", self.count, self.stride);
        true
    }

    pub fn release(&mut self, backend: &mut B) {
        if let Some(handle) = self.handle.take() {
            backend.release_storage_buffer(handle);
            self.releases += 1;
        }
        self.count = 0;
        self.stride = 0;
    }

    #[must_use]
    pub fn handle(&self) -> Option<&B::Buffer> {
        self.handle.as_ref()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    #[must_use]
    pub fn releases(&self) -> u64 {
        self.releases
    }
}

pub struct ScenePipeline<B: GpuBackend> {
    sphere_batch: Arc<SphereBatch>,
    mesh_batch: Arc<MeshBatch>,
    sphere_version: u64,
    mesh_version: u64,

    pub spheres: BufferSlot<B>,
    pub mesh_objects: BufferSlot<B>,
    pub vertices: BufferSlot<B>,
    pub indices: BufferSlot<B>,
}

impl<B: GpuBackend> Default for ScenePipeline<B> {
    fn default() -> Self {
        Self {
            sphere_batch: Arc::default(),
            mesh_batch: Arc::default(),
            sphere_version: 0,
            mesh_version: 0,
            spheres: BufferSlot::new(),
            mesh_objects: BufferSlot::new(),
            vertices: BufferSlot::new(),
            indices: BufferSlot::new(),
        }
    }
}

impl<B: GpuBackend> ScenePipeline<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild_spheres(&mut self, scene: &mut SceneContext, backend: &mut B) -> bool {
        if !scene.registry().spheres_dirty() {
            return false;
        }
        scene.registry_mut().clear_spheres_dirty();

        self.sphere_version += 1;
        let batch = SphereBatch::build(scene, self.sphere_version);
        log::debug!("Rebuilding spheres v{}: {} records", batch.version, batch.len());

        self.spheres.upload(backend, "Sphere Buffer", &batch.spheres);
        self.sphere_batch = Arc::new(batch);
        true
    }

    pub fn rebuild_mesh_objects(&mut self, scene: &mut SceneContext, backend: &mut B) -> bool {
        if !scene.registry().mesh_objects_dirty() {
            return false;
        }
        scene.registry_mut().clear_mesh_objects_dirty();

        self.mesh_version += 1;
        let batch = MeshBatch::build(scene, self.mesh_version);
        log::debug!(
            "Rebuilding mesh objects v{}: {} objects, {} vertices, {} indices",
            batch.version,
            batch.objects.len(),
            batch.vertices.len(),
            batch.indices.len()
        );

        self.mesh_objects
            .upload(backend, "Mesh Object Buffer", &batch.objects);
        self.vertices.upload(backend, "Vertex Buffer", &batch.vertices);
        self.indices.upload(backend, "Index Buffer", &batch.indices);
        self.mesh_batch = Arc::new(batch);
        true
    }

    #[must_use]
    pub fn sphere_batch(&self) -> Arc<SphereBatch> {
        Arc::clone(&self.sphere_batch)
    }

    #[must_use]
    pub fn mesh_batch(&self) -> Arc<MeshBatch> {
        Arc::clone(&self.mesh_batch)
    }

    #[must_use]
    pub fn bindings(&self) -> SceneBindings<'_, B::Buffer> {
        SceneBindings {
            spheres: self.spheres.handle(),
            mesh_objects: self.mesh_objects.handle(),
            vertices: self.vertices.handle(),
            indices: self.indices.handle(),
        }
    }

    pub fn release_all(&mut self, backend: &mut B) {
        self.spheres.release(backend);
        self.mesh_objects.release(backend);
        self.vertices.release(backend);
        self.indices.release(backend);
    }
}
