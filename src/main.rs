mod app;

use anyhow::Context;
use winit::event_loop::{ControlFlow, EventLoop};

use pathtrace_wgpu::settings::TracerSettings;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // optional JSON settings file as the only argument
    let settings = match std::env::args_os().nth(1) {
        Some(path) => TracerSettings::load(&path)
            .with_context(|| format!("loading settings from {}", path.to_string_lossy()))?,
        None => TracerSettings::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::App::new(settings);
    event_loop.run_app(&mut app)?;
    app.finish()
}
