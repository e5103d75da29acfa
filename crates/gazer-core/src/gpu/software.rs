use half::f16;

use crate::consts::TEXTURE_CHANNELS;
use crate::error::{GazerError, Result};

use super::mipmap::downsample_chain;
use super::{Capabilities, TextureBackend, TextureDesc, TextureStorage};

/// Texture kept in host memory, one vector per mip level.
pub struct SoftwareTexture {
    pub width: u32,
    pub height: u32,
    pub auto_mipmap: bool,
    pub levels: Vec<Vec<f16>>,
}

/// In-memory backend with configurable capabilities. Used headless and to
/// exercise every mipmap path without a device.
pub struct SoftwareBackend {
    caps: Capabilities,
}

impl SoftwareBackend {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// Reports no hardware mipmap support, forcing the host path.
    pub fn without_mipmap_support() -> Self {
        Self::new(Capabilities {
            framebuffer_mipmap: false,
            sampler_mipmap: false,
            max_texture_dimension: 16_384,
        })
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(Capabilities {
            framebuffer_mipmap: true,
            sampler_mipmap: true,
            max_texture_dimension: 16_384,
        })
    }
}

fn software(storage: &TextureStorage) -> Result<&SoftwareTexture> {
    match storage {
        TextureStorage::Software(tex) => Ok(tex),
        #[allow(unreachable_patterns)]
        _ => Err(GazerError::Render("texture belongs to another backend".into())),
    }
}

fn software_mut(storage: &mut TextureStorage) -> Result<&mut SoftwareTexture> {
    match storage {
        TextureStorage::Software(tex) => Ok(tex),
        #[allow(unreachable_patterns)]
        _ => Err(GazerError::Render("texture belongs to another backend".into())),
    }
}

fn level_size(tex: &SoftwareTexture, level: u32) -> (u32, u32) {
    ((tex.width >> level).max(1), (tex.height >> level).max(1))
}

impl TextureBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "Software"
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureStorage> {
        if desc.width > self.caps.max_texture_dimension
            || desc.height > self.caps.max_texture_dimension
        {
            return Err(GazerError::Render(format!(
                "{}x{} exceeds maximum texture size {}",
                desc.width, desc.height, self.caps.max_texture_dimension
            )));
        }
        let mut tex = SoftwareTexture {
            width: desc.width,
            height: desc.height,
            auto_mipmap: desc.auto_mipmap,
            levels: Vec::with_capacity(desc.mip_levels as usize),
        };
        for level in 0..desc.mip_levels {
            let (w, h) = level_size(&tex, level);
            tex.levels
                .push(vec![f16::ZERO; w as usize * h as usize * TEXTURE_CHANNELS]);
        }
        Ok(TextureStorage::Software(tex))
    }

    fn write_level(
        &self,
        storage: &mut TextureStorage,
        level: u32,
        width: u32,
        height: u32,
        texels: &[f16],
    ) -> Result<()> {
        let tex = software_mut(storage)?;
        if level as usize >= tex.levels.len() {
            return Err(GazerError::Render(format!("mip level {level} out of range")));
        }
        if level_size(tex, level) != (width, height)
            || texels.len() != width as usize * height as usize * TEXTURE_CHANNELS
        {
            return Err(GazerError::Render(format!(
                "level {level} upload of {width}x{height} does not match texture"
            )));
        }
        tex.levels[level as usize].copy_from_slice(texels);

        if level == 0 && tex.auto_mipmap {
            self.generate_mipmaps(storage)?;
        }
        Ok(())
    }

    fn generate_mipmaps(&self, storage: &mut TextureStorage) -> Result<()> {
        let tex = software_mut(storage)?;
        let count = tex.levels.len() as u32;
        let chain = downsample_chain(&tex.levels[0], tex.width, tex.height, count);
        for (dst, level) in tex.levels[1..].iter_mut().zip(chain) {
            *dst = level;
        }
        Ok(())
    }

    fn read_level(&self, storage: &TextureStorage, level: u32) -> Result<Vec<f32>> {
        let tex = software(storage)?;
        tex.levels
            .get(level as usize)
            .map(|texels| texels.iter().map(|v| v.to_f32()).collect())
            .ok_or_else(|| GazerError::Render(format!("mip level {level} out of range")))
    }
}
