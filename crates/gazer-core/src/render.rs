//! Draws the current texture as a pan/zoom transformed quad, either through
//! the tonemap shader or straight through.

use std::sync::Arc;

use crate::error::{GazerError, Result};
use crate::gpu::{GpuTexture, TextureStorage};
use crate::tonemap::{TonemapState, TONEMAP_WGSL};
use crate::view::{FrameUniforms, ViewState};

const QUAD_WGSL: &str = include_str!("shaders/quad.wgsl");

pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    tonemap_pipeline: wgpu::RenderPipeline,
    passthrough_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// Bind group of the texture drawn last, keyed by texture id.
    bound: Option<(u64, wgpu::BindGroup)>,
    viewport: [u32; 2],
}

impl Renderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        Self::with_tonemap_source(device, queue, target_format, TONEMAP_WGSL)
    }

    /// Build the pipelines around a custom `tonemap` WGSL function.
    pub fn with_tonemap_source(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        target_format: wgpu::TextureFormat,
        tonemap_wgsl: &str,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("image-trilinear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let source = format!("{tonemap_wgsl}\n{QUAD_WGSL}");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("image-quad"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("image-quad"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline = |label: &str, fragment: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let tonemap_pipeline = pipeline("image-tonemap", "fs_tonemap");
        let passthrough_pipeline = pipeline("image-passthrough", "fs_passthrough");

        Self {
            device,
            queue,
            tonemap_pipeline,
            passthrough_pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            sampler,
            bound: None,
            viewport: [1, 1],
        }
    }

    /// Re-establish the 1:1 projection for a new target size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = [width.max(1), height.max(1)];
    }

    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }

    fn texture_bind_group(&mut self, texture: &GpuTexture) -> Result<&wgpu::BindGroup> {
        let view = match &texture.storage {
            TextureStorage::Wgpu { view, .. } => view,
            TextureStorage::Software(_) => {
                return Err(GazerError::Render(
                    "texture was not uploaded to this device".into(),
                ))
            }
        };

        if self.bound.as_ref().map(|(id, _)| *id) != Some(texture.id) {
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("image-bind"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.bound = Some((texture.id, bind_group));
        }

        match &self.bound {
            Some((_, bind_group)) => Ok(bind_group),
            None => Err(GazerError::Render("texture bind group missing".into())),
        }
    }

    /// Draw one frame into `target`. Without a texture the target is only
    /// cleared. Nothing is submitted if the frame fails validation.
    pub fn render(
        &mut self,
        target: &wgpu::TextureView,
        texture: Option<&GpuTexture>,
        view: &ViewState,
        tonemap: &TonemapState,
    ) -> Result<()> {
        let uniforms = FrameUniforms::new(view, tonemap, self.viewport);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let encoded = self.encode(target, texture, tonemap.enabled);
        let error = pollster::block_on(self.device.pop_error_scope());

        let commands = encoded?;
        if let Some(err) = error {
            return Err(GazerError::Render(format!("draw: {err}")));
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.queue.submit(std::iter::once(commands));
        Ok(())
    }

    fn encode(
        &mut self,
        target: &wgpu::TextureView,
        texture: Option<&GpuTexture>,
        tonemap_enabled: bool,
    ) -> Result<wgpu::CommandBuffer> {
        let bind_group = match texture {
            Some(texture) => Some(self.texture_bind_group(texture)?.clone()),
            None => None,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("image"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(bind_group) = &bind_group {
                let pipeline = if tonemap_enabled {
                    &self.tonemap_pipeline
                } else {
                    &self.passthrough_pipeline
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, bind_group, &[]);
                pass.draw(0..4, 0..1);
            }
        }
        Ok(encoder.finish())
    }
}
