use std::sync::Arc;

use glam::Vec3;
use pathtrace_wgpu::backend::{bound, CompositeMode};
use pathtrace_wgpu::camera::{Camera, CameraPose};
use pathtrace_wgpu::geometry;
use pathtrace_wgpu::headless::HeadlessBackend;
use pathtrace_wgpu::orchestrator::FrameOrchestrator;
use pathtrace_wgpu::quality::{SkyboxMode, MAX_SAMPLES_PER_PIXEL};
use pathtrace_wgpu::scene::{ObjectProperties, SurfaceMaterial, Transform};
use pathtrace_wgpu::settings::TracerSettings;

fn pose() -> CameraPose {
    Camera::default().pose(16.0 / 9.0)
}

fn settings(width: u32, height: u32) -> TracerSettings {
    TracerSettings {
        width,
        height,
        ..TracerSettings::default()
    }
}

fn with_sphere(orch: &mut FrameOrchestrator<HeadlessBackend>) -> pathtrace_wgpu::scene::EntityKey {
    orch.scene_mut()
        .spawn_sphere(Transform::IDENTITY, &SurfaceMaterial::default(), ObjectProperties::default())
        .unwrap()
}

#[test]
fn dispatch_grid_rounds_up() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(1281, 719));

    let report = orch.render_frame(&pose(), &mut backend);
    assert_eq!(report.groups, [161, 90]);
    assert_eq!(backend.last_dispatch().unwrap().groups, [161, 90]);
}

#[test]
fn reset_frame_ends_with_one_sample() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(64, 64));
    let key = with_sphere(&mut orch);

    for _ in 0..5 {
        orch.render_frame(&pose(), &mut backend);
    }
    assert_eq!(orch.current_sample(), 5);

    orch.scene_mut().transform_mut(key).unwrap().translation = Vec3::new(0.0, 2.0, 0.0);
    let report = orch.render_frame(&pose(), &mut backend);

    assert!(report.reset);
    assert!(report.rebuilt_spheres);
    assert!(!report.rebuilt_meshes);
    assert_eq!(report.sample_count, 1);
    assert_eq!(backend.last_composite().unwrap().sample_count, 0);
}

#[test]
fn moved_mesh_rebuilds_in_place_and_resets() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(64, 64));
    let key = orch
        .scene_mut()
        .spawn_mesh_object(
            Arc::new(geometry::create_cube()),
            Transform::IDENTITY,
            &SurfaceMaterial::default(),
            ObjectProperties::default(),
        )
        .unwrap();

    for _ in 0..3 {
        orch.render_frame(&pose(), &mut backend);
    }
    assert_eq!(backend.buffers_created(), 3);
    assert_eq!(backend.writes(), 0);

    orch.scene_mut().transform_mut(key).unwrap().translation = Vec3::new(0.5, 0.0, -1.0);
    let report = orch.render_frame(&pose(), &mut backend);

    assert!(report.reset);
    assert!(report.rebuilt_meshes);
    assert!(!report.rebuilt_spheres);
    assert_eq!(report.sample_count, 1);
    // object, vertex and index buffers are overwritten, not reallocated
    assert_eq!(backend.buffers_created(), 3);
    assert_eq!(backend.writes(), 3);
    assert_eq!(
        backend.last_dispatch().unwrap().bound_mask,
        bound::MESH_OBJECTS | bound::VERTICES | bound::INDICES
    );

    let report = orch.render_frame(&pose(), &mut backend);
    assert!(!report.rebuilt_meshes);
    assert_eq!(report.sample_count, 2);
}

#[test]
fn double_reset_without_dispatch_stays_at_zero() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(16, 16));
    for _ in 0..3 {
        orch.render_frame(&pose(), &mut backend);
    }

    orch.reset_accumulation();
    orch.reset_accumulation();
    assert_eq!(orch.current_sample(), 0);

    let report = orch.render_frame(&pose(), &mut backend);
    assert!(report.reset);
    assert_eq!(report.sample_count, 1);
}

#[test]
fn camera_motion_resets_without_rebuilding() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(64, 64));
    with_sphere(&mut orch);
    orch.render_frame(&pose(), &mut backend);
    orch.render_frame(&pose(), &mut backend);

    let mut camera = Camera::default();
    camera.orbit(Vec3::ZERO, 0.1);
    let report = orch.render_frame(&camera.pose(16.0 / 9.0), &mut backend);

    assert!(report.reset);
    assert!(!report.rebuilt_spheres);
    assert_eq!(report.sample_count, 1);
}

#[test]
fn static_scene_rebuilds_once() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(64, 64));
    with_sphere(&mut orch);

    let first = orch.render_frame(&pose(), &mut backend);
    assert!(first.rebuilt_spheres);
    for _ in 0..3 {
        let report = orch.render_frame(&pose(), &mut backend);
        assert!(!report.rebuilt_spheres);
        assert!(!report.reset);
    }
    assert_eq!(backend.buffers_created(), 1);
    assert_eq!(backend.last_dispatch().unwrap().bound_mask, bound::SPHERES);
}

#[test]
fn resolution_change_recreates_target() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(64, 64));
    orch.render_frame(&pose(), &mut backend);
    orch.render_frame(&pose(), &mut backend);
    assert_eq!(backend.targets_created(), 1);

    orch.set_resolution(128, 32);
    let report = orch.render_frame(&pose(), &mut backend);

    assert!(report.reset);
    assert_eq!(report.sample_count, 1);
    assert_eq!(report.groups, [16, 4]);
    assert_eq!(backend.targets_created(), 2);
    assert_eq!(backend.live_targets(), 1);
    assert_eq!(backend.last_dispatch().unwrap().target_size, (128, 32));
}

#[test]
fn night_after_vaporwave_is_exclusive() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(16, 16));

    orch.select_skybox(SkyboxMode::Vaporwave);
    orch.select_skybox(SkyboxMode::Night);
    orch.render_frame(&pose(), &mut backend);

    let params = backend.last_dispatch().unwrap().params;
    assert_eq!(params.use_night_skybox, 1);
    assert_eq!(params.use_vaporwave_skybox, 0);
    assert_eq!(params.use_skybox_texture, 0);
}

#[test]
fn saturated_adjustments_are_refused() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&TracerSettings {
        samples_per_pixel: MAX_SAMPLES_PER_PIXEL,
        ray_bounce_limit: 1,
        ..settings(16, 16)
    });
    orch.render_frame(&pose(), &mut backend);

    assert!(!orch.increment_samples_per_pixel());
    assert!(!orch.decrement_ray_bounce_limit());
    assert_eq!(orch.samples_per_pixel(), orch.max_samples_per_pixel());
    assert_eq!(orch.ray_bounce_limit(), 1);
    assert_eq!(orch.current_sample(), 1);

    assert!(orch.increment_ray_bounce_limit());
    assert_eq!(orch.current_sample(), 0);
    assert_eq!(orch.max_ray_bounce_limit(), 20);
}

#[test]
fn denoiser_toggle_resets_and_switches_mode() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(16, 16));
    orch.render_frame(&pose(), &mut backend);
    orch.render_frame(&pose(), &mut backend);

    orch.set_denoiser(false);
    let report = orch.render_frame(&pose(), &mut backend);
    assert!(report.reset);
    assert_eq!(backend.last_composite().unwrap().mode, CompositeMode::Copy);

    // no change, no reset
    orch.set_denoiser(false);
    let report = orch.render_frame(&pose(), &mut backend);
    assert!(!report.reset);
    assert_eq!(report.sample_count, 2);
}

#[test]
fn shutdown_releases_everything_once() {
    let mut backend = HeadlessBackend::new();
    let mut orch = FrameOrchestrator::new(&settings(32, 32));
    with_sphere(&mut orch);
    orch.scene_mut()
        .spawn_mesh_object(
            Arc::new(geometry::create_cube()),
            Transform::IDENTITY,
            &SurfaceMaterial::default(),
            ObjectProperties::default(),
        )
        .unwrap();

    orch.render_frame(&pose(), &mut backend);
    assert_eq!(backend.live_buffers(), 4);
    assert_eq!(backend.live_targets(), 1);

    orch.shutdown(&mut backend);
    orch.shutdown(&mut backend);
    assert_eq!(backend.live_buffers(), 0);
    assert_eq!(backend.live_targets(), 0);
    assert!(orch.target().is_none());
    assert_eq!(orch.pipeline().spheres.releases(), 1);

    // rendering again brings everything back
    orch.render_frame(&pose(), &mut backend);
    assert_eq!(backend.live_buffers(), 4);
}

#[test]
fn independent_orchestrators_do_not_share_scenes() {
    let mut backend = HeadlessBackend::new();
    let mut a = FrameOrchestrator::new(&settings(16, 16));
    let mut b = FrameOrchestrator::new(&settings(16, 16));
    with_sphere(&mut a);

    a.render_frame(&pose(), &mut backend);
    b.render_frame(&pose(), &mut backend);

    assert_eq!(a.scene().len(), 1);
    assert!(b.scene().is_empty());
    assert_eq!(backend.last_dispatch().unwrap().bound_mask, 0);
}
