use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use pathtrace_wgpu::camera::Camera;
use pathtrace_wgpu::demo::DemoScene;
use pathtrace_wgpu::gpu_backend::{load_skybox_image, WgpuBackend};
use pathtrace_wgpu::orchestrator::FrameOrchestrator;
use pathtrace_wgpu::quality::SkyboxMode;
use pathtrace_wgpu::settings::TracerSettings;
use pathtrace_wgpu::wgpu_ctx::WgpuContext;

// radians per second
const ORBIT_SPEED: f32 = 0.3;

struct State {
    window: Arc<Window>,
    backend: WgpuBackend,
    orchestrator: FrameOrchestrator<WgpuBackend>,
    camera: Camera,
    demo: DemoScene,

    orbit: bool,
    animate_light: bool,
    clock: f32,
    last_frame: Instant,
    shown_sample: Option<u32>,
}

impl State {
    async fn new(window: Arc<Window>, settings: &TracerSettings) -> anyhow::Result<Self> {
        let ctx = WgpuContext::new(window.clone(), settings.vsync)
            .await
            .context("initialising wgpu")?;

        let skybox = match &settings.skybox_texture {
            Some(path) => match load_skybox_image(path) {
                Ok(image) => Some(image),
                Err(err) => {
                    log::warn!("Skybox {} unavailable: {err}", path.display());
                    None
                }
            },
            None => None,
        };
        let backend = WgpuBackend::new(ctx, skybox.as_ref());

        let mut orchestrator = FrameOrchestrator::new(settings);
        let demo = DemoScene::build(orchestrator.scene_mut()).context("building demo scene")?;

        // render at window resolution
        let size = window.inner_size();
        orchestrator.set_resolution(size.width, size.height);

        let mut camera = Camera {
            position: glam::Vec3::new(0.0, 0.6, 4.5),
            ..Camera::default()
        };
        camera.look_at(demo.focus);

        Ok(Self {
            window,
            backend,
            orchestrator,
            camera,
            demo,
            orbit: false,
            animate_light: true,
            clock: 0.0,
            last_frame: Instant::now(),
            shown_sample: None,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.backend.resize(size);
        self.orchestrator.set_resolution(size.width, size.height);
    }

    fn handle_key(&mut self, event: &KeyEvent, el: &ActiveEventLoop) {
        if !event.state.is_pressed() || event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        let orch = &mut self.orchestrator;
        match code {
            KeyCode::ArrowUp => {
                orch.increment_samples_per_pixel();
            }
            KeyCode::ArrowDown => {
                orch.decrement_samples_per_pixel();
            }
            KeyCode::ArrowRight => {
                orch.increment_ray_bounce_limit();
            }
            KeyCode::ArrowLeft => {
                orch.decrement_ray_bounce_limit();
            }
            KeyCode::Digit1 => orch.select_skybox(SkyboxMode::Standard),
            KeyCode::Digit2 => orch.select_skybox(SkyboxMode::Vaporwave),
            KeyCode::Digit3 => orch.select_skybox(SkyboxMode::Night),
            KeyCode::Digit4 => orch.select_skybox(SkyboxMode::Textured),
            KeyCode::KeyD => {
                orch.toggle_denoiser();
            }
            KeyCode::KeyO => {
                self.orbit = !self.orbit;
                log::info!("Orbit {}", if self.orbit { "on" } else { "off" });
            }
            KeyCode::Space => {
                self.animate_light = !self.animate_light;
                log::info!("Light animation {}", if self.animate_light { "on" } else { "off" });
            }
            KeyCode::Escape => el.exit(),
            _ => {}
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.animate_light {
            self.clock += dt;
            self.demo.animate(self.orchestrator.scene_mut(), self.clock);
        }
        if self.orbit {
            self.camera.orbit(self.demo.focus, dt * ORBIT_SPEED);
        }

        let (width, height) = self.orchestrator.resolution();
        let pose = self.camera.pose(width as f32 / height as f32);
        let report = self.orchestrator.render_frame(&pose, &mut self.backend);

        if let Some(target) = self.orchestrator.target() {
            self.backend.present(target)?;
        }

        if self.shown_sample != Some(report.sample_count) {
            self.shown_sample = Some(report.sample_count);
            self.window.set_title(&format!(
                "pathtrace-wgpu | {} samples | {} spp | {} bounces",
                report.sample_count,
                self.orchestrator.samples_per_pixel(),
                self.orchestrator.ray_bounce_limit()
            ));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.orchestrator.shutdown(&mut self.backend);
        self.backend.submit();
    }
}

pub struct App {
    settings: TracerSettings,
    state: Option<State>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: TracerSettings) -> Self {
        Self {
            settings,
            state: None,
            error: None,
        }
    }

    pub fn finish(self) -> anyhow::Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, el: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if let Some(state) = &mut self.state {
            state.shutdown();
        }
        self.error = Some(err);
        el.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("pathtrace-wgpu")
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = match el.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(el, err.into()),
        };

        match pollster::block_on(State::new(window, &self.settings)) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(el, err),
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _: WindowId, ev: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match ev {
            WindowEvent::CloseRequested => {
                state.shutdown();
                el.exit();
            }
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::KeyboardInput { event, .. } => state.handle_key(&event, el),
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.render() {
                    return self.fail(el, err);
                }
                state.window.request_redraw();
            }
            _ => (),
        }
    }

    fn exiting(&mut self, _: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.shutdown();
        }
    }
}
