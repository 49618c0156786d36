use std::sync::Arc;

use glam::Vec3;
use pathtrace_wgpu::geometry::Mesh;
use pathtrace_wgpu::headless::HeadlessBackend;
use pathtrace_wgpu::scene::{
    MaterialType, MeshObjectRecord, ObjectProperties, SceneContext, ScenePipeline, ShadingModel,
    SphereRecord, SurfaceMaterial, Transform,
};

fn read_records<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

fn sphere_records(backend: &HeadlessBackend, pipeline: &ScenePipeline<HeadlessBackend>) -> Vec<SphereRecord> {
    let handle = pipeline.spheres.handle().expect("sphere buffer bound");
    let bytes = backend.contents(handle).expect("live buffer");
    read_records(bytes)
}

fn spawn_spheres(scene: &mut SceneContext, n: usize) {
    for i in 0..n {
        scene
            .spawn_sphere(
                Transform::from_translation(Vec3::new(i as f32, 0.0, 0.0)),
                &SurfaceMaterial::default(),
                ObjectProperties::default(),
            )
            .unwrap();
    }
}

#[test]
fn clean_sphere_flag_leaves_buffer_untouched() {
    let mut backend = HeadlessBackend::new();
    let mut pipeline = ScenePipeline::new();
    let mut scene = SceneContext::new();
    spawn_spheres(&mut scene, 2);

    assert!(pipeline.rebuild_spheres(&mut scene, &mut backend));
    let before = sphere_records(&backend, &pipeline);
    let version = pipeline.sphere_batch().version;

    // move a sphere without flagging it: the rebuild must not notice
    let key = scene.registry().spheres()[0];
    scene.transform_mut(key).unwrap().translation = Vec3::splat(9.0);

    assert!(!pipeline.rebuild_spheres(&mut scene, &mut backend));
    assert_eq!(sphere_records(&backend, &pipeline), before);
    assert_eq!(pipeline.spheres.element_count(), 2);
    assert_eq!(pipeline.sphere_batch().version, version);
    assert_eq!(backend.writes(), 0);
}

#[test]
fn mesh_indices_are_rebased_into_one_pool() {
    let mut backend = HeadlessBackend::new();
    let mut pipeline = ScenePipeline::new();
    let mut scene = SceneContext::new();

    let a = Arc::new(Mesh::new("A", vec![[0.0; 3]; 3], vec![0, 1, 2]));
    let b = Arc::new(Mesh::new("B", vec![[1.0; 3]; 4], vec![0, 1, 2, 3]));
    for mesh in [a, b] {
        scene
            .spawn_mesh_object(mesh, Transform::IDENTITY, &SurfaceMaterial::default(), ObjectProperties::default())
            .unwrap();
    }

    assert!(pipeline.rebuild_mesh_objects(&mut scene, &mut backend));
    let batch = pipeline.mesh_batch();
    assert_eq!(batch.indices, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(batch.vertices.len(), 7);
    assert!(batch.validate());

    let index_bytes = backend.contents(pipeline.indices.handle().unwrap()).unwrap();
    let uploaded: Vec<u32> = read_records(index_bytes);
    assert_eq!(uploaded, vec![0, 1, 2, 3, 4, 5, 6]);

    let object_bytes = backend.contents(pipeline.mesh_objects.handle().unwrap()).unwrap();
    let objects: Vec<MeshObjectRecord> = read_records(object_bytes);
    assert_eq!((objects[1].indices_offset, objects[1].indices_count), (3, 4));
    assert_eq!(pipeline.vertices.stride(), 12);
    assert_eq!(pipeline.indices.stride(), 4);
}

#[test]
fn registered_sphere_lands_in_buffer() {
    let mut backend = HeadlessBackend::new();
    let mut pipeline = ScenePipeline::new();
    let mut scene = SceneContext::new();

    // linear 0.8 expressed in sRGB
    let srgb = 0.906_332_4;
    let source = SurfaceMaterial::new([srgb, srgb, srgb, 1.0]).emission([5.0, 5.0, 5.0]);
    let key = scene
        .spawn_sphere(
            Transform::IDENTITY.with_uniform_scale(2.0),
            &source,
            ObjectProperties::default(),
        )
        .unwrap();

    pipeline.rebuild_spheres(&mut scene, &mut backend);
    let records = sphere_records(&backend, &pipeline);
    assert_eq!(records.len(), 1);

    let record = records[0];
    assert_eq!(record.center, [0.0, 0.0, 0.0]);
    assert_eq!(record.radius, 1.0);
    assert_eq!(record.material.material_type, MaterialType::Lambertian as u32);
    for c in record.material.albedo {
        assert!((c - 0.8).abs() < 1e-4, "albedo {c}");
    }
    assert_eq!(record.material.emission, [0.0; 3]);
    assert_eq!(record.material.emission_power, 0.0);

    // switching to emissive afterwards does not re-resolve the material
    scene.entity_mut(key).unwrap().properties.shading = ShadingModel::Emissive { power: 4.0 };
    scene.registry_mut().mark_spheres_dirty();
    pipeline.rebuild_spheres(&mut scene, &mut backend);

    let record = sphere_records(&backend, &pipeline)[0];
    assert_eq!(record.material.material_type, MaterialType::Lambertian as u32);
    assert_eq!(record.material.emission, [0.0; 3]);
    assert_eq!(record.material.emission_power, 0.0);
}

#[test]
fn count_change_reallocates_but_same_count_does_not() {
    let mut backend = HeadlessBackend::new();
    let mut pipeline = ScenePipeline::new();
    let mut scene = SceneContext::new();

    spawn_spheres(&mut scene, 3);
    pipeline.rebuild_spheres(&mut scene, &mut backend);
    assert_eq!(pipeline.spheres.allocations(), 1);

    // 3 -> 3: overwritten in place
    scene.registry_mut().mark_spheres_dirty();
    pipeline.rebuild_spheres(&mut scene, &mut backend);
    assert_eq!(pipeline.spheres.allocations(), 1);
    assert_eq!(pipeline.spheres.releases(), 0);
    assert_eq!(backend.writes(), 1);

    // 3 -> 5: released and reallocated
    spawn_spheres(&mut scene, 2);
    pipeline.rebuild_spheres(&mut scene, &mut backend);
    assert_eq!(pipeline.spheres.allocations(), 2);
    assert_eq!(pipeline.spheres.releases(), 1);
    assert_eq!(pipeline.spheres.element_count(), 5);
    assert_eq!(backend.live_buffers(), 1);
}

#[test]
fn empty_scene_leaves_buffers_unbound() {
    let mut backend = HeadlessBackend::new();
    let mut pipeline = ScenePipeline::new();
    let mut scene = SceneContext::new();

    spawn_spheres(&mut scene, 1);
    pipeline.rebuild_spheres(&mut scene, &mut backend);
    assert!(pipeline.spheres.is_bound());

    let key = scene.registry().spheres()[0];
    scene.deactivate(key);
    scene.registry_mut().mark_mesh_objects_dirty();
    pipeline.rebuild_spheres(&mut scene, &mut backend);
    pipeline.rebuild_mesh_objects(&mut scene, &mut backend);

    let bindings = pipeline.bindings();
    assert!(bindings.spheres.is_none());
    assert!(bindings.mesh_objects.is_none());
    assert!(bindings.vertices.is_none());
    assert!(bindings.indices.is_none());
    assert_eq!(bindings.bound_mask(), 0);
    assert_eq!(backend.live_buffers(), 0);
}
