mod backend;
pub mod mipmap;
pub mod software;
mod upload;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub use backend::{
    Capabilities, FilterConfig, FilterMode, GpuTexture, MipmapStrategy, TextureBackend,
    TextureDesc, TextureStorage,
};
pub use upload::{mip_level_count, TextureUploader};
