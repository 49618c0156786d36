//! The per-frame render loop. Anything that invalidates the accumulated image
//! resets the sample counter before the dispatch, so a reset frame always ends
//! with a sample count of one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::accumulation::AccumulationState;
use crate::backend::{dispatch_groups, CompositeMode, GpuBackend, KernelParams};
use crate::camera::CameraPose;
use crate::motion::MotionTracker;
use crate::quality::{QualityController, SkyboxMode};
use crate::scene::{SceneContext, ScenePipeline};
use crate::settings::TracerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStage {
    #[default]
    Idle,
    DirtyCheck,
    Rebuilding,
    ParameterUpload,
    Dispatch,
    Composite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub sample_count: u32,
    pub groups: [u32; 2],
    pub rebuilt_spheres: bool,
    pub rebuilt_meshes: bool,
    pub reset: bool,
}

pub struct FrameOrchestrator<B: GpuBackend> {
    scene: SceneContext,
    pipeline: ScenePipeline<B>,
    motion: MotionTracker,
    accumulation: AccumulationState,
    quality: QualityController,

    target: Option<B::Target>,
    target_size: (u32, u32),
    width: u32,
    height: u32,

    rng: StdRng,
    stage: FrameStage,
    // set by anything outside the frame loop that invalidates the image
    pending_reset: bool,
}

impl<B: GpuBackend> FrameOrchestrator<B> {
    pub fn new(settings: &TracerSettings) -> Self {
        Self::with_scene(settings, SceneContext::new())
    }

    pub fn with_scene(settings: &TracerSettings, scene: SceneContext) -> Self {
        Self {
            scene,
            pipeline: ScenePipeline::new(),
            motion: MotionTracker::new(),
            accumulation: AccumulationState::new(),
            quality: QualityController::new(
                settings.samples_per_pixel,
                settings.ray_bounce_limit,
                settings.skybox,
                settings.denoise,
            ),
            target: None,
            target_size: (0, 0),
            width: settings.width.max(1),
            height: settings.height.max(1),
            rng: StdRng::seed_from_u64(settings.seed),
            stage: FrameStage::Idle,
            pending_reset: false,
        }
    }

    fn enter(&mut self, stage: FrameStage) {
        log::trace!("{:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    pub fn render_frame(&mut self, camera: &CameraPose, backend: &mut B) -> FrameReport {
        let mut reset = std::mem::take(&mut self.pending_reset);

        // Dirty check
        self.enter(FrameStage::DirtyCheck);
        let motion = self.motion.detect(camera, &self.scene);
        if motion.spheres_moved {
            self.scene.registry_mut().mark_spheres_dirty();
        }
        if motion.meshes_moved {
            self.scene.registry_mut().mark_mesh_objects_dirty();
        }
        reset |= motion.any();

        // Rebuild
        self.enter(FrameStage::Rebuilding);
        let rebuilt_spheres = self.pipeline.rebuild_spheres(&mut self.scene, backend);
        let rebuilt_meshes = self.pipeline.rebuild_mesh_objects(&mut self.scene, backend);
        reset |= rebuilt_spheres || rebuilt_meshes;

        // Parameters
        self.enter(FrameStage::ParameterUpload);
        let seed: f32 = self.rng.random();
        let bindings = self.pipeline.bindings();
        let params = KernelParams::new(
            camera,
            self.quality.skybox().flags(),
            self.quality.samples_per_pixel().value(),
            self.quality.ray_bounce_limit().value(),
            seed,
            bindings.bound_mask(),
        );

        // Dispatch
        self.enter(FrameStage::Dispatch);
        reset |= ensure_target(
            &mut self.target,
            &mut self.target_size,
            (self.width, self.height),
            backend,
        );
        if reset {
            self.accumulation.reset();
        }

        let groups = dispatch_groups(self.width, self.height);
        if let Some(target) = self.target.as_ref() {
            backend.dispatch(target, &params, self.pipeline.bindings(), groups);
        }

        // Composite
        self.enter(FrameStage::Composite);
        let mode = if self.quality.denoise() {
            CompositeMode::Denoise
        } else {
            CompositeMode::Copy
        };
        if let Some(target) = self.target.as_ref() {
            backend.composite(target, mode, self.accumulation.current());
        }
        self.accumulation.advance();

        self.enter(FrameStage::Idle);
        FrameReport {
            sample_count: self.accumulation.current(),
            groups,
            rebuilt_spheres,
            rebuilt_meshes,
            reset,
        }
    }

    // the target is recreated on the next frame
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resolution {width}x{height}");
            return;
        }
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn shutdown(&mut self, backend: &mut B) {
        self.pipeline.release_all(backend);
        if let Some(target) = self.target.take() {
            backend.release_accumulation_target(target);
        }
        self.target_size = (0, 0);
        self.motion.clear();
        self.accumulation.reset();
        // buffers are gone, so the next frame must upload everything again
        self.scene.registry_mut().mark_spheres_dirty();
        self.scene.registry_mut().mark_mesh_objects_dirty();
        log::debug!("Frame orchestrator shut down");
    }

    pub fn reset_accumulation(&mut self) {
        self.accumulation.reset();
        self.pending_reset = true;
    }

    // Quality API

    pub fn increment_samples_per_pixel(&mut self) -> bool {
        let changed = self.quality.increment_samples_per_pixel();
        self.after_adjustment(changed, "samples per pixel", "increment")
    }

    pub fn decrement_samples_per_pixel(&mut self) -> bool {
        let changed = self.quality.decrement_samples_per_pixel();
        self.after_adjustment(changed, "samples per pixel", "decrement")
    }

    pub fn increment_ray_bounce_limit(&mut self) -> bool {
        let changed = self.quality.increment_ray_bounce_limit();
        self.after_adjustment(changed, "ray bounce limit", "increment")
    }

    pub fn decrement_ray_bounce_limit(&mut self) -> bool {
        let changed = self.quality.decrement_ray_bounce_limit();
        self.after_adjustment(changed, "ray bounce limit", "decrement")
    }

    fn after_adjustment(&mut self, changed: bool, what: &str, op: &str) -> bool {
        if changed {
            log::info!(
                "Samples per pixel: {}, ray bounce limit: {}",
                self.quality.samples_per_pixel().value(),
                self.quality.ray_bounce_limit().value()
            );
            self.reset_accumulation();
        } else {
            log::warn!("Refused to {op} {what}: already at its limit");
        }
        changed
    }

    #[must_use]
    pub fn samples_per_pixel(&self) -> u32 {
        self.quality.samples_per_pixel().value()
    }

    #[must_use]
    pub fn max_samples_per_pixel(&self) -> u32 {
        self.quality.samples_per_pixel().max()
    }

    #[must_use]
    pub fn ray_bounce_limit(&self) -> u32 {
        self.quality.ray_bounce_limit().value()
    }

    #[must_use]
    pub fn max_ray_bounce_limit(&self) -> u32 {
        self.quality.ray_bounce_limit().max()
    }

    pub fn select_skybox(&mut self, mode: SkyboxMode) {
        self.quality.select_skybox(mode);
        log::info!("Skybox: {mode:?}");
        self.reset_accumulation();
    }

    pub fn set_denoiser(&mut self, enabled: bool) {
        if self.quality.set_denoise(enabled) {
            log::info!("Denoiser {}", if enabled { "on" } else { "off" });
            self.reset_accumulation();
        }
    }

    pub fn toggle_denoiser(&mut self) -> bool {
        let enabled = !self.quality.denoise();
        self.set_denoiser(enabled);
        enabled
    }

    #[must_use]
    pub fn current_sample(&self) -> u32 {
        self.accumulation.current()
    }

    #[must_use]
    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    #[must_use]
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    #[must_use]
    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneContext {
        &mut self.scene
    }

    #[must_use]
    pub fn pipeline(&self) -> &ScenePipeline<B> {
        &self.pipeline
    }

    #[must_use]
    pub fn target(&self) -> Option<&B::Target> {
        self.target.as_ref()
    }
}

// true if a new target was created
fn ensure_target<B: GpuBackend>(
    target: &mut Option<B::Target>,
    current_size: &mut (u32, u32),
    wanted: (u32, u32),
    backend: &mut B,
) -> bool {
    if target.is_some() && *current_size == wanted {
        return false;
    }
    if let Some(old) = target.take() {
        backend.release_accumulation_target(old);
    }
    log::debug!("Creating accumulation target {}x{}", wanted.0, wanted.1);
    *target = Some(backend.create_accumulation_target(wanted.0, wanted.1));
    *current_size = wanted;
    true
}
