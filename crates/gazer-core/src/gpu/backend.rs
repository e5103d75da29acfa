use std::fmt;

use half::f16;
use tracing::warn;

use crate::config::MipmapPreference;
use crate::error::Result;

use super::software::SoftwareTexture;

/// What the device can do for mipmap generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Mip levels can be rendered from the base level after upload.
    pub framebuffer_mipmap: bool,
    /// Mip levels are produced as part of writing the base level.
    pub sampler_mipmap: bool,
    pub max_texture_dimension: u32,
}

/// How a texture's mip chain gets built. Resolved once per uploader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MipmapStrategy {
    HardwareAutoMipmap,
    HardwareSamplerMipmap,
    HostMipmap,
}

impl MipmapStrategy {
    pub fn resolve(caps: &Capabilities, preference: MipmapPreference) -> Self {
        let auto = if caps.framebuffer_mipmap {
            MipmapStrategy::HardwareAutoMipmap
        } else if caps.sampler_mipmap {
            MipmapStrategy::HardwareSamplerMipmap
        } else {
            MipmapStrategy::HostMipmap
        };

        match preference {
            MipmapPreference::Auto => auto,
            MipmapPreference::Host => MipmapStrategy::HostMipmap,
            MipmapPreference::Framebuffer if caps.framebuffer_mipmap => {
                MipmapStrategy::HardwareAutoMipmap
            }
            MipmapPreference::Sampler if caps.sampler_mipmap => {
                MipmapStrategy::HardwareSamplerMipmap
            }
            forced => {
                warn!(preference = %forced, fallback = %auto, "Mipmap path not supported by device");
                auto
            }
        }
    }
}

impl fmt::Display for MipmapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MipmapStrategy::HardwareAutoMipmap => write!(f, "Hardware (framebuffer)"),
            MipmapStrategy::HardwareSamplerMipmap => write!(f, "Hardware (sampler)"),
            MipmapStrategy::HostMipmap => write!(f, "Host"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampling configuration of an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    pub mag: FilterMode,
    pub min: FilterMode,
    /// Interpolation between mip levels.
    pub mipmap: FilterMode,
}

impl FilterConfig {
    /// Linear magnification, trilinear minification.
    pub const TRILINEAR: FilterConfig = FilterConfig {
        mag: FilterMode::Linear,
        min: FilterMode::Linear,
        mipmap: FilterMode::Linear,
    };
}

/// Parameters for allocating a texture. The format is always RGBA half
/// float.
#[derive(Clone, Debug)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    /// Build the mip chain whenever level 0 is written.
    pub auto_mipmap: bool,
}

/// Device memory behind a [`GpuTexture`].
pub enum TextureStorage {
    Software(SoftwareTexture),
    #[cfg(feature = "gpu")]
    Wgpu {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        auto_mipmap: bool,
    },
}

impl fmt::Debug for TextureStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureStorage::Software(_) => write!(f, "TextureStorage::Software"),
            #[cfg(feature = "gpu")]
            TextureStorage::Wgpu { .. } => write!(f, "TextureStorage::Wgpu"),
        }
    }
}

/// An uploaded image. Dropping it releases the device memory.
#[derive(Debug)]
pub struct GpuTexture {
    /// Unique per upload; lets the renderer notice a replaced texture.
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub strategy: MipmapStrategy,
    pub filter: FilterConfig,
    /// Rows are stored top-first and must be mirrored when drawn.
    pub flip_y: bool,
    pub storage: TextureStorage,
}

/// Device seam for texture upload: the software implementation keeps
/// everything in host memory, the wgpu one talks to a real adapter.
pub trait TextureBackend {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureStorage>;

    /// Write one mip level of RGBA half-float texels.
    fn write_level(
        &self,
        storage: &mut TextureStorage,
        level: u32,
        width: u32,
        height: u32,
        texels: &[f16],
    ) -> Result<()>;

    /// Fill levels 1.. from level 0.
    fn generate_mipmaps(&self, storage: &mut TextureStorage) -> Result<()>;

    /// Read a level back as RGBA floats, rows in storage order.
    fn read_level(&self, storage: &TextureStorage, level: u32) -> Result<Vec<f32>>;
}
