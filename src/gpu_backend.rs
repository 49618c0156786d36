use std::path::Path;

use crate::backend::{CompositeMode, GpuBackend, KernelParams, SceneBindings};
use crate::error::{Result, TracerError};
use crate::passes::composite::{CompositeParams, DISPLAY_FORMAT};
use crate::passes::{CompositePass, PresentPass, TraceBindings, TracePass};
use crate::wgpu_ctx::WgpuContext;
use crate::wgpu_utils::{create_buffer, create_buffer_init, create_texture_2d, generate_white_texture_data};

// Large enough for one element of every scene buffer kind.
const PLACEHOLDER_SIZE: u64 = 256;

pub struct WgpuBuffer {
    id: u64,
    buffer: wgpu::Buffer,
}

impl WgpuBuffer {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

pub struct WgpuTarget {
    id: u64,
    pub width: u32,
    pub height: u32,
    accumulation: wgpu::Texture,
    accumulation_view: wgpu::TextureView,
    display: wgpu::Texture,
    display_view: wgpu::TextureView,
    composite_bind_group: wgpu::BindGroup,
    present_bind_group: wgpu::BindGroup,
}

// target id plus one id per scene buffer, 0 for the placeholder
type BindingKey = [u64; 5];

pub struct WgpuBackend {
    pub ctx: WgpuContext,
    trace: TracePass,
    composite: CompositePass,
    present: PresentPass,

    params_buffer: wgpu::Buffer,
    composite_params_buffer: wgpu::Buffer,
    placeholder: wgpu::Buffer,
    _skybox: wgpu::Texture,
    skybox_view: wgpu::TextureView,

    trace_bind_group: Option<(BindingKey, wgpu::BindGroup)>,
    encoder: Option<wgpu::CommandEncoder>,
    next_id: u64,
}

pub fn load_skybox_image(path: &Path) -> Result<image::RgbaImage> {
    log::info!("Loading skybox {}", path.display());
    let image = image::open(path)?;
    Ok(image.to_rgba8())
}

impl WgpuBackend {
    // without a skybox image the textured skybox samples 1x1 white
    pub fn new(ctx: WgpuContext, skybox: Option<&image::RgbaImage>) -> Self {
        let trace = TracePass::new(&ctx);
        let composite = CompositePass::new(&ctx);
        let present = PresentPass::new(&ctx);

        let params_buffer = create_buffer(
            &ctx.device,
            "Kernel Params Buffer",
            std::mem::size_of::<KernelParams>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let composite_params_buffer = create_buffer_init(
            &ctx.device,
            "Composite Params Buffer",
            &[CompositeParams {
                sample_count: 0,
                _padding: [0; 3],
            }],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let placeholder = create_buffer(
            &ctx.device,
            "Placeholder Storage Buffer",
            PLACEHOLDER_SIZE,
            wgpu::BufferUsages::STORAGE,
        );

        let (width, height, pixels) = match skybox {
            Some(image) => (image.width(), image.height(), image.as_raw().clone()),
            None => (1, 1, generate_white_texture_data(1, 1)),
        };
        let skybox_texture = create_texture_2d(
            &ctx.device,
            "Skybox Texture",
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &skybox_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let skybox_view = skybox_texture.create_view(&Default::default());

        Self {
            ctx,
            trace,
            composite,
            present,
            params_buffer,
            composite_params_buffer,
            placeholder,
            _skybox: skybox_texture,
            skybox_view,
            trace_bind_group: None,
            encoder: None,
            next_id: 0,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    // a lost or outdated surface is reconfigured and the frame skipped
    pub fn present(&mut self, target: &WgpuTarget) -> Result<()> {
        let frame = match self.ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                self.submit();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out");
                self.submit();
                return Ok(());
            }
            Err(err) => {
                self.submit();
                return Err(TracerError::Surface(err));
            }
        };

        let view = frame.texture.create_view(&Default::default());
        let encoder = frame_encoder(&mut self.encoder, &self.ctx.device);
        self.present
            .execute(encoder, &view, &target.present_bind_group);

        self.submit();
        frame.present();
        Ok(())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
    }

    fn binding_key(target: &WgpuTarget, scene: &SceneBindings<'_, WgpuBuffer>) -> BindingKey {
        let id = |b: Option<&WgpuBuffer>| b.map_or(0, |b| b.id);
        [
            target.id,
            id(scene.spheres),
            id(scene.mesh_objects),
            id(scene.vertices),
            id(scene.indices),
        ]
    }

    fn invalidate_bindings_with(&mut self, id: u64) {
        let stale = self
            .trace_bind_group
            .as_ref()
            .is_some_and(|(key, _)| key.contains(&id));
        if stale {
            self.trace_bind_group = None;
        }
    }
}

// every declared binding must be bound; the kernel skips these via the bound mask
fn or_placeholder<'a>(buffer: Option<&'a WgpuBuffer>, placeholder: &'a wgpu::Buffer) -> &'a wgpu::Buffer {
    buffer.map_or(placeholder, |b| &b.buffer)
}

fn frame_encoder<'a>(
    slot: &'a mut Option<wgpu::CommandEncoder>,
    device: &wgpu::Device,
) -> &'a mut wgpu::CommandEncoder {
    slot.get_or_insert_with(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        })
    })
}

impl GpuBackend for WgpuBackend {
    type Buffer = WgpuBuffer;
    type Target = WgpuTarget;

    fn create_storage_buffer(&mut self, label: &str, contents: &[u8], _stride: u32) -> WgpuBuffer {
        let id = self.allocate_id();
        let buffer = create_buffer_init(
            &self.ctx.device,
            label,
            contents,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        WgpuBuffer { id, buffer }
    }

    fn write_storage_buffer(&mut self, buffer: &WgpuBuffer, contents: &[u8]) {
        self.ctx.queue.write_buffer(&buffer.buffer, 0, contents);
    }

    fn release_storage_buffer(&mut self, buffer: WgpuBuffer) {
        self.invalidate_bindings_with(buffer.id);
        buffer.buffer.destroy();
    }

    fn create_accumulation_target(&mut self, width: u32, height: u32) -> WgpuTarget {
        let id = self.allocate_id();
        let device = &self.ctx.device;

        let accumulation = create_texture_2d(
            device,
            "Accumulation Target",
            width,
            height,
            wgpu::TextureFormat::Rgba32Float,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let accumulation_view = accumulation.create_view(&Default::default());

        let display = create_texture_2d(
            device,
            "Display Target",
            width,
            height,
            DISPLAY_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let display_view = display.create_view(&Default::default());

        let composite_bind_group =
            self.composite
                .create_bind_group(device, &accumulation_view, &self.composite_params_buffer);
        let present_bind_group = self.present.create_bind_group(device, &display_view);

        WgpuTarget {
            id,
            width,
            height,
            accumulation,
            accumulation_view,
            display,
            display_view,
            composite_bind_group,
            present_bind_group,
        }
    }

    fn release_accumulation_target(&mut self, target: WgpuTarget) {
        self.invalidate_bindings_with(target.id);
        target.accumulation.destroy();
        target.display.destroy();
    }

    fn dispatch(
        &mut self,
        target: &WgpuTarget,
        params: &KernelParams,
        scene: SceneBindings<'_, WgpuBuffer>,
        groups: [u32; 2],
    ) {
        self.ctx
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let key = Self::binding_key(target, &scene);
        let cached = matches!(&self.trace_bind_group, Some((k, _)) if *k == key);
        if !cached {
            let placeholder = &self.placeholder;
            let bind_group = self.trace.create_bind_group(
                &self.ctx.device,
                &TraceBindings {
                    output: &target.accumulation_view,
                    params: &self.params_buffer,
                    skybox: &self.skybox_view,
                    spheres: or_placeholder(scene.spheres, placeholder),
                    mesh_objects: or_placeholder(scene.mesh_objects, placeholder),
                    vertices: or_placeholder(scene.vertices, placeholder),
                    indices: or_placeholder(scene.indices, placeholder),
                },
            );
            self.trace_bind_group = Some((key, bind_group));
        }

        let encoder = frame_encoder(&mut self.encoder, &self.ctx.device);
        if let Some((_, bind_group)) = &self.trace_bind_group {
            self.trace.execute(encoder, bind_group, groups);
        }
    }

    fn composite(&mut self, target: &WgpuTarget, mode: CompositeMode, sample_count: u32) {
        self.ctx.queue.write_buffer(
            &self.composite_params_buffer,
            0,
            bytemuck::bytes_of(&CompositeParams {
                sample_count,
                _padding: [0; 3],
            }),
        );

        let encoder = frame_encoder(&mut self.encoder, &self.ctx.device);
        self.composite
            .execute(encoder, &target.display_view, &target.composite_bind_group, mode);
    }
}
