pub mod buffers;
pub mod builder;
pub mod material;
pub mod registry;
pub mod transform;

use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::geometry::Mesh;

pub use buffers::{BufferSlot, ScenePipeline};
pub use builder::{MeshBatch, MeshBatchBuilder, MeshObjectRecord, SphereBatch, SphereRecord};
pub use material::{
    MaterialRecord, MaterialSource, MaterialType, ObjectProperties, ResolvedMaterial, ShadingModel,
    SurfaceMaterial,
};
pub use registry::Registry;
pub use transform::Transform;

new_key_type! {
    pub struct EntityKey;
}

#[derive(Debug, Clone)]
pub enum Shape {
    // centre is the world position, radius is half the X scale
    Sphere,
    Mesh(Arc<Mesh>),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub transform: Transform,
    // as given at spawn; editing them does not re-resolve the material
    pub properties: ObjectProperties,
    // fixed at spawn: the registry list and the resolved material depend on them
    shape: Shape,
    material: ResolvedMaterial,
    active: bool,
}

impl Entity {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> &ResolvedMaterial {
        &self.material
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// All path-traced entities of one scene plus the registry of which ones are
/// currently active. Owned by the frame orchestrator; independent instances
/// do not share state.
#[derive(Debug, Default)]
pub struct SceneContext {
    entities: SlotMap<EntityKey, Entity>,
    registry: Registry,
}

impl SceneContext {
    pub fn new() -> Self {
        Self::default()
    }

    // the material is resolved here, once
    pub fn spawn_sphere(
        &mut self,
        transform: Transform,
        source: &dyn MaterialSource,
        properties: ObjectProperties,
    ) -> Result<EntityKey> {
        self.spawn(transform, Shape::Sphere, source, properties)
    }

    pub fn spawn_mesh_object(
        &mut self,
        mesh: Arc<Mesh>,
        transform: Transform,
        source: &dyn MaterialSource,
        properties: ObjectProperties,
    ) -> Result<EntityKey> {
        self.spawn(transform, Shape::Mesh(mesh), source, properties)
    }

    fn spawn(
        &mut self,
        transform: Transform,
        shape: Shape,
        source: &dyn MaterialSource,
        properties: ObjectProperties,
    ) -> Result<EntityKey> {
        let material = material::resolve(source, &properties)?;
        let key = self.entities.insert(Entity {
            transform,
            shape,
            properties,
            material,
            active: false,
        });
        self.activate(key);
        Ok(key)
    }

    pub fn despawn(&mut self, key: EntityKey) -> Option<Entity> {
        self.deactivate(key);
        self.entities.remove(key)
    }

    // false for unknown or already active entities
    pub fn activate(&mut self, key: EntityKey) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };
        if entity.active {
            return false;
        }
        entity.active = true;
        match entity.shape {
            Shape::Sphere => self.registry.register_sphere(key),
            Shape::Mesh(_) => self.registry.register_mesh_object(key),
        }
        true
    }

    pub fn deactivate(&mut self, key: EntityKey) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };
        if !entity.active {
            return false;
        }
        entity.active = false;
        // by membership, so the entity leaves whichever list holds it
        if self.registry.is_sphere(key) {
            self.registry.unregister_sphere(key);
        }
        if self.registry.is_mesh_object(key) {
            self.registry.unregister_mesh_object(key);
        }
        true
    }

    #[must_use]
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    // motion is picked up by the per-frame diff, nothing to flag here
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    pub fn transform_mut(&mut self, key: EntityKey) -> Option<&mut Transform> {
        self.entities.get_mut(key).map(|e| &mut e.transform)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn active_spheres(&self) -> impl Iterator<Item = (EntityKey, &Entity)> + '_ {
        self.registry
            .spheres()
            .iter()
            .filter_map(|&key| {
                let entity = self.entities.get(key)?;
                matches!(entity.shape, Shape::Sphere).then_some((key, entity))
            })
    }

    pub fn active_mesh_objects(&self) -> impl Iterator<Item = (EntityKey, &Entity, &Mesh)> + '_ {
        self.registry
            .mesh_objects()
            .iter()
            .filter_map(|&key| {
                let entity = self.entities.get(key)?;
                match &entity.shape {
                    Shape::Mesh(mesh) => Some((key, entity, mesh.as_ref())),
                    Shape::Sphere => None,
                }
            })
    }
}
