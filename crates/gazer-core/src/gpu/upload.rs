use tracing::{debug, info};

use crate::buffer::ImageBuffer;
use crate::config::MipmapPreference;
use crate::error::{GazerError, Result};

use super::mipmap::MipScratch;
use super::{FilterConfig, GpuTexture, MipmapStrategy, TextureBackend, TextureDesc};

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Turns decoded images into textures, using the mipmap path chosen when
/// the uploader was created.
pub struct TextureUploader {
    strategy: MipmapStrategy,
    max_dimension: u32,
    scratch: MipScratch,
    next_id: u64,
}

impl TextureUploader {
    pub fn new(backend: &dyn TextureBackend, preference: MipmapPreference) -> Self {
        let caps = backend.capabilities();
        let strategy = MipmapStrategy::resolve(&caps, preference);
        info!(
            backend = backend.name(),
            strategy = %strategy,
            max_dimension = caps.max_texture_dimension,
            "Texture uploader ready"
        );
        Self {
            strategy,
            max_dimension: caps.max_texture_dimension,
            scratch: MipScratch::new(),
            next_id: 1,
        }
    }

    pub fn strategy(&self) -> MipmapStrategy {
        self.strategy
    }

    pub fn scratch(&self) -> &MipScratch {
        &self.scratch
    }

    /// Upload `image` as an RGBA half-float texture with a full mip chain.
    ///
    /// The host path writes rows already mirrored, so it clears the image's
    /// `flip_y`; the returned texture's `flip_y` always says what the
    /// renderer still has to do.
    pub fn upload(
        &mut self,
        backend: &dyn TextureBackend,
        image: &mut ImageBuffer,
    ) -> Result<GpuTexture> {
        let (width, height) = (image.width(), image.height());
        if width > self.max_dimension || height > self.max_dimension {
            return Err(GazerError::Render(format!(
                "{width}x{height} exceeds maximum texture size {}",
                self.max_dimension
            )));
        }

        let mip_levels = mip_level_count(width, height);
        let id = self.next_id;
        let desc = TextureDesc {
            label: format!("gazer-image-{id}"),
            width,
            height,
            mip_levels,
            auto_mipmap: self.strategy == MipmapStrategy::HardwareSamplerMipmap,
        };
        let mut storage = backend.create_texture(&desc)?;

        let result = match self.strategy {
            MipmapStrategy::HardwareAutoMipmap => {
                let base = self.scratch.base_f16(image);
                backend
                    .write_level(&mut storage, 0, width, height, base)
                    .and_then(|_| backend.generate_mipmaps(&mut storage))
            }
            MipmapStrategy::HardwareSamplerMipmap => {
                let base = self.scratch.base_f16(image);
                backend.write_level(&mut storage, 0, width, height, base)
            }
            MipmapStrategy::HostMipmap => self.upload_host_levels(backend, &mut storage, image),
        };
        self.scratch.clear();
        result?;

        if self.strategy == MipmapStrategy::HostMipmap {
            image.flip_y = false;
        }
        self.next_id += 1;

        debug!(id, width, height, mip_levels, strategy = %self.strategy, "Texture uploaded");
        Ok(GpuTexture {
            id,
            width,
            height,
            mip_levels,
            strategy: self.strategy,
            filter: FilterConfig::TRILINEAR,
            flip_y: image.flip_y,
            storage,
        })
    }

    fn upload_host_levels(
        &mut self,
        backend: &dyn TextureBackend,
        storage: &mut super::TextureStorage,
        image: &ImageBuffer,
    ) -> Result<()> {
        let levels = self.scratch.build(image, mip_level_count(image.width(), image.height()));
        let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width, l.height)).collect();
        for (index, (w, h)) in sizes.into_iter().enumerate() {
            let texels = self.scratch.level_f16(index);
            backend.write_level(storage, index as u32, w, h, texels)?;
        }
        Ok(())
    }
}
