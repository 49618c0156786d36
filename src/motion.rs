use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::camera::CameraPose;
use crate::scene::{EntityKey, SceneContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionReport {
    pub camera_moved: bool,
    pub spheres_moved: bool,
    pub meshes_moved: bool,
}

impl MotionReport {
    #[must_use]
    pub fn any(&self) -> bool {
        self.camera_moved || self.spheres_moved || self.meshes_moved
    }
}

/// Diffs the camera pose and every registered entity's matrix against the
/// previous frame. Newly seen entities are not reported; registering them
/// already raised a dirty flag.
#[derive(Debug, Default)]
pub struct MotionTracker {
    camera: Option<CameraPose>,
    spheres: FxHashMap<EntityKey, Mat4>,
    meshes: FxHashMap<EntityKey, Mat4>,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&mut self, camera: &CameraPose, scene: &SceneContext) -> MotionReport {
        let camera_moved = self.camera.as_ref() != Some(camera);
        self.camera = Some(*camera);

        let spheres_moved = diff_snapshot(
            &mut self.spheres,
            scene
                .active_spheres()
                .map(|(key, e)| (key, e.transform.local_to_world())),
        );
        let meshes_moved = diff_snapshot(
            &mut self.meshes,
            scene
                .active_mesh_objects()
                .map(|(key, e, _)| (key, e.transform.local_to_world())),
        );

        MotionReport {
            camera_moved,
            spheres_moved,
            meshes_moved,
        }
    }

    #[must_use]
    pub fn tracked(&self) -> usize {
        self.spheres.len() + self.meshes.len()
    }

    pub fn clear(&mut self) {
        self.camera = None;
        self.spheres.clear();
        self.meshes.clear();
    }
}

fn diff_snapshot(
    snapshot: &mut FxHashMap<EntityKey, Mat4>,
    current: impl Iterator<Item = (EntityKey, Mat4)>,
) -> bool {
    let mut moved = false;
    let mut next = FxHashMap::with_capacity_and_hasher(snapshot.len(), Default::default());

    for (key, matrix) in current {
        if let Some(previous) = snapshot.get(&key) {
            moved |= *previous != matrix;
        }
        next.insert(key, matrix);
    }

    // entities that left the registry are forgotten here
    *snapshot = next;
    moved
}
