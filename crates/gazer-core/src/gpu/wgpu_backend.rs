//! wgpu texture backend (Vulkan / Metal / DX12 / GL).
//!
//! Both hardware mipmap paths render each level from the one above it with
//! a linear sampler. The framebuffer path does it as a separate step after
//! the base level is written; the sampler path does it inside the base
//! level write. Both need a filterable, renderable texture format, so a
//! device either supports both or neither (see [`capabilities_for`]).

use std::sync::Arc;

use half::f16;

use crate::consts::TEXTURE_CHANNELS;
use crate::error::{GazerError, Result};

use super::{Capabilities, TextureBackend, TextureDesc, TextureStorage};

/// Internal format of every uploaded image.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const TEXEL_BYTES: u32 = (TEXTURE_CHANNELS * std::mem::size_of::<f16>()) as u32;

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    caps: Capabilities,
    downsample_pipeline: wgpu::RenderPipeline,
    downsample_sampler: wgpu::Sampler,
}

impl WgpuBackend {
    /// Headless backend on the best available adapter.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GazerError::Render(format!("No suitable GPU adapter found: {e}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gazer"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            ..Default::default()
        }))
        .map_err(|e| GazerError::Render(format!("Failed to create GPU device: {e}")))?;

        Ok(Self::from_device(&adapter, Arc::new(device), Arc::new(queue)))
    }

    /// Share a device that was created for a window surface.
    pub fn from_device(
        adapter: &wgpu::Adapter,
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
    ) -> Self {
        let adapter_name = adapter.get_info().name.clone();
        tracing::info!("GPU adapter: {adapter_name}");

        let caps = capabilities_for(
            &adapter.get_texture_format_features(TEXTURE_FORMAT),
            &device.limits(),
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("downsample"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/downsample.wgsl").into()),
        });
        let downsample_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("downsample"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TEXTURE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let downsample_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("downsample"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            device,
            queue,
            adapter_name,
            caps,
            downsample_pipeline,
            downsample_sampler,
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    fn checked<T>(&self, stage: &str, f: impl FnOnce() -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        match validation.or(oom) {
            Some(err) => Err(GazerError::Render(format!("{stage}: {err}"))),
            None => Ok(value),
        }
    }

    fn downsample(&self, texture: &wgpu::Texture) {
        let layout = self.downsample_pipeline.get_bind_group_layout(0);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mipmaps"),
            });

        for level in 1..texture.mip_level_count() {
            let level_view = |mip: u32| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    base_mip_level: mip,
                    mip_level_count: Some(1),
                    ..Default::default()
                })
            };
            let src = level_view(level - 1);
            let dst = level_view(level);
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.downsample_sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mip level"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.downsample_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Mipmap capabilities of the texture format on this device.
///
/// Both hardware paths render levels with a linear sampler, so they need the
/// same format support and are reported together. `Auto` therefore picks the
/// framebuffer path whenever the device can render to the texture; the
/// sampler path is only chosen through an explicit preference.
pub fn capabilities_for(
    features: &wgpu::TextureFormatFeatures,
    limits: &wgpu::Limits,
) -> Capabilities {
    let filterable = features
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
    let renderable = features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT);
    let hardware = filterable && renderable;
    Capabilities {
        framebuffer_mipmap: hardware,
        sampler_mipmap: hardware,
        max_texture_dimension: limits.max_texture_dimension_2d,
    }
}

fn wgpu_texture(storage: &TextureStorage) -> Result<(&wgpu::Texture, bool)> {
    match storage {
        TextureStorage::Wgpu {
            texture,
            auto_mipmap,
            ..
        } => Ok((texture, *auto_mipmap)),
        _ => Err(GazerError::Render("texture belongs to another backend".into())),
    }
}

impl TextureBackend for WgpuBackend {
    fn name(&self) -> &str {
        &self.adapter_name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureStorage> {
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;
        if self.caps.framebuffer_mipmap || self.caps.sampler_mipmap {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = self.checked("create texture", || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(desc.label.as_str()),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: desc.mip_levels,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage,
                view_formats: &[],
            })
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(TextureStorage::Wgpu {
            texture,
            view,
            auto_mipmap: desc.auto_mipmap,
        })
    }

    fn write_level(
        &self,
        storage: &mut TextureStorage,
        level: u32,
        width: u32,
        height: u32,
        texels: &[f16],
    ) -> Result<()> {
        let (texture, auto_mipmap) = wgpu_texture(storage)?;
        self.checked("write texture", || {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(texels),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * TEXEL_BYTES),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            if level == 0 && auto_mipmap {
                self.downsample(texture);
            }
        })
    }

    fn generate_mipmaps(&self, storage: &mut TextureStorage) -> Result<()> {
        let (texture, _) = wgpu_texture(storage)?;
        self.checked("generate mipmaps", || self.downsample(texture))
    }

    fn read_level(&self, storage: &TextureStorage, level: u32) -> Result<Vec<f32>> {
        let (texture, _) = wgpu_texture(storage)?;
        let width = (texture.width() >> level).max(1);
        let height = (texture.height() >> level).max(1);
        let unpadded = width * TEXEL_BYTES;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.checked("read texture", || {
            let mut enc = self.device.create_command_encoder(&Default::default());
            enc.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &staging,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded),
                        rows_per_image: Some(height),
                    },
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            self.queue.submit(std::iter::once(enc.finish()));
        })?;

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| GazerError::Render(format!("device poll failed: {e}")))?;
        rx.recv()
            .map_err(|_| GazerError::Render("GPU channel closed".into()))?
            .map_err(|e| GazerError::Render(format!("buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let mut texels = Vec::with_capacity((width * height) as usize * TEXTURE_CHANNELS);
        for row in data.chunks(padded as usize) {
            let halves: &[f16] = bytemuck::cast_slice(&row[..unpadded as usize]);
            texels.extend(halves.iter().map(|v| v.to_f32()));
        }
        drop(data);
        staging.unmap();
        Ok(texels)
    }
}
