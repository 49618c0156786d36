use bytemuck::{Pod, Zeroable};

use crate::backend::CompositeMode;
use crate::wgpu_ctx::WgpuContext;
use crate::wgpu_utils::{fullscreen_pipeline, texture_entry, uniform_entry};

// blendable, unlike the Rgba32Float accumulation target
pub const DISPLAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CompositeParams {
    pub sample_count: u32,
    pub _padding: [u32; 3],
}

pub struct CompositePass {
    pub denoise_pipeline: wgpu::RenderPipeline,
    pub copy_pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

impl CompositePass {
    pub fn new(ctx: &WgpuContext) -> Self {
        let shader = ctx
            .device
            .create_shader_module(wgpu::include_wgsl!("../shaders/composite.wgsl"));

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Composite Bind Group Layout"),
                entries: &[
                    // Rgba32Float is not filterable, the shader uses textureLoad
                    texture_entry(0, wgpu::ShaderStages::FRAGMENT, false),
                    uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let denoise_pipeline = fullscreen_pipeline(
            &ctx.device,
            "Composite Denoise Pipeline",
            &shader,
            &layout,
            DISPLAY_FORMAT,
            Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::REPLACE,
            }),
        );
        let copy_pipeline = fullscreen_pipeline(
            &ctx.device,
            "Composite Copy Pipeline",
            &shader,
            &layout,
            DISPLAY_FORMAT,
            None,
        );

        Self {
            denoise_pipeline,
            copy_pipeline,
            layout,
        }
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        accumulation_view: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(accumulation_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        display_view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        mode: CompositeMode,
    ) {
        let pipeline = match mode {
            CompositeMode::Denoise => &self.denoise_pipeline,
            CompositeMode::Copy => &self.copy_pipeline,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: display_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    // the running average lives in the display target
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}
