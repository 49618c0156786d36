use super::EntityKey;

// Lists keep registration order, which is the record order in the buffers.
// Membership only changes through SceneContext activation; outside the crate
// only the dirty flags are writable.
#[derive(Debug, Default)]
pub struct Registry {
    spheres: Vec<EntityKey>,
    mesh_objects: Vec<EntityKey>,
    spheres_dirty: bool,
    mesh_objects_dirty: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // registering twice is a caller error
    pub(crate) fn register_sphere(&mut self, key: EntityKey) {
        debug_assert!(!self.spheres.contains(&key), "sphere {key:?} registered twice");
        self.spheres.push(key);
        self.spheres_dirty = true;
    }

    pub(crate) fn unregister_sphere(&mut self, key: EntityKey) {
        if !remove_key(&mut self.spheres, key) {
            log::warn!("Unregistering unknown sphere {key:?}");
        }
        self.spheres_dirty = true;
    }

    pub(crate) fn register_mesh_object(&mut self, key: EntityKey) {
        debug_assert!(
            !self.mesh_objects.contains(&key),
            "mesh object {key:?} registered twice"
        );
        self.mesh_objects.push(key);
        self.mesh_objects_dirty = true;
    }

    pub(crate) fn unregister_mesh_object(&mut self, key: EntityKey) {
        if !remove_key(&mut self.mesh_objects, key) {
            log::warn!("Unregistering unknown mesh object {key:?}");
        }
        self.mesh_objects_dirty = true;
    }

    #[must_use]
    pub fn spheres(&self) -> &[EntityKey] {
        &self.spheres
    }

    #[must_use]
    pub fn mesh_objects(&self) -> &[EntityKey] {
        &self.mesh_objects
    }

    #[must_use]
    pub fn is_sphere(&self, key: EntityKey) -> bool {
        self.spheres.contains(&key)
    }

    #[must_use]
    pub fn is_mesh_object(&self, key: EntityKey) -> bool {
        self.mesh_objects.contains(&key)
    }

    #[inline]
    #[must_use]
    pub fn spheres_dirty(&self) -> bool {
        self.spheres_dirty
    }

    #[inline]
    #[must_use]
    pub fn mesh_objects_dirty(&self) -> bool {
        self.mesh_objects_dirty
    }

    pub fn mark_spheres_dirty(&mut self) {
        self.spheres_dirty = true;
    }

    pub fn mark_mesh_objects_dirty(&mut self) {
        self.mesh_objects_dirty = true;
    }

    pub fn clear_spheres_dirty(&mut self) {
        self.spheres_dirty = false;
    }

    pub fn clear_mesh_objects_dirty(&mut self) {
        self.mesh_objects_dirty = false;
    }
}

fn remove_key(keys: &mut Vec<EntityKey>, key: EntityKey) -> bool {
    match keys.iter().position(|&k| k == key) {
        Some(index) => {
            keys.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<EntityKey> {
        let mut map: SlotMap<EntityKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn register_raises_only_its_own_flag() {
        let k = keys(2);
        let mut reg = Registry::new();
        reg.register_sphere(k[0]);
        assert!(reg.spheres_dirty());
        assert!(!reg.mesh_objects_dirty());

        reg.register_mesh_object(k[1]);
        assert!(reg.mesh_objects_dirty());
    }

    #[test]
    fn unregister_raises_flag_after_clear() {
        let k = keys(1);
        let mut reg = Registry::new();
        reg.register_sphere(k[0]);
        reg.clear_spheres_dirty();

        reg.unregister_sphere(k[0]);
        assert!(reg.spheres_dirty());
        assert!(reg.spheres().is_empty());
    }

    #[test]
    fn registration_order_is_kept() {
        let k = keys(3);
        let mut reg = Registry::new();
        reg.register_mesh_object(k[2]);
        reg.register_mesh_object(k[0]);
        reg.register_mesh_object(k[1]);
        reg.unregister_mesh_object(k[0]);
        assert_eq!(reg.mesh_objects(), &[k[2], k[1]]);
    }

    #[test]
    fn unknown_unregister_still_marks_dirty() {
        let k = keys(1);
        let mut reg = Registry::new();
        reg.unregister_mesh_object(k[0]);
        assert!(reg.mesh_objects_dirty());
    }
}
