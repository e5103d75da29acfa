use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_EXPOSURE, EXPOSURE_STEP, MAX_EXPOSURE, MAX_ZOOM, MIN_EXPOSURE, MIN_ZOOM,
    RAW_DECODER_PROGRAM, RAW_DECODE_ARGS, RAW_IDENTIFY_ARGS, STATUS_TIMEOUT_MS, ZOOM_STEP,
};
use crate::error::{GazerError, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazerConfig {
    pub raw_decoder: RawDecoderConfig,
    pub view: ViewConfig,
    pub tonemap: TonemapConfig,
    pub render: RenderConfig,
    pub status: StatusConfig,
}

impl GazerConfig {
    /// Read a TOML config file. Missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| GazerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject step sizes and bounds the view and tonemap state cannot use.
    pub fn validate(&self) -> Result<()> {
        let view = &self.view;
        if !(view.zoom_step.is_finite() && view.zoom_step > 0.0) {
            return Err(GazerError::Config(format!(
                "view.zoom_step must be a positive number, got {}",
                view.zoom_step
            )));
        }
        if !(view.min_zoom.is_finite() && view.min_zoom > 0.0) {
            return Err(GazerError::Config(format!(
                "view.min_zoom must be greater than zero, got {}",
                view.min_zoom
            )));
        }
        if !(view.max_zoom.is_finite() && view.max_zoom >= view.min_zoom) {
            return Err(GazerError::Config(format!(
                "view.max_zoom ({}) must not be below view.min_zoom ({})",
                view.max_zoom, view.min_zoom
            )));
        }

        let tonemap = &self.tonemap;
        if !(tonemap.exposure_step.is_finite() && tonemap.exposure_step > 0.0) {
            return Err(GazerError::Config(format!(
                "tonemap.exposure_step must be a positive number, got {}",
                tonemap.exposure_step
            )));
        }
        if !(tonemap.min_exposure.is_finite()
            && tonemap.max_exposure.is_finite()
            && tonemap.min_exposure <= tonemap.max_exposure)
        {
            return Err(GazerError::Config(format!(
                "tonemap exposure range [{}, {}] is empty",
                tonemap.min_exposure, tonemap.max_exposure
            )));
        }
        if !tonemap.exposure.is_finite() {
            return Err(GazerError::Config(format!(
                "tonemap.exposure must be finite, got {}",
                tonemap.exposure
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GazerError::Config(e.to_string()))
    }
}

/// External raw decoder invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDecoderConfig {
    pub program: String,
    pub identify_args: Vec<String>,
    pub decode_args: Vec<String>,
}

impl Default for RawDecoderConfig {
    fn default() -> Self {
        Self {
            program: RAW_DECODER_PROGRAM.to_string(),
            identify_args: RAW_IDENTIFY_ARGS.iter().map(|s| s.to_string()).collect(),
            decode_args: RAW_DECODE_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom_step: ZOOM_STEP,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonemapConfig {
    /// Whether the tonemap shader starts enabled.
    pub enabled: bool,
    pub exposure: f32,
    pub exposure_step: f32,
    pub min_exposure: f32,
    pub max_exposure: f32,
}

impl Default for TonemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure: DEFAULT_EXPOSURE,
            exposure_step: EXPOSURE_STEP,
            min_exposure: MIN_EXPOSURE,
            max_exposure: MAX_EXPOSURE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mipmap: MipmapPreference,
}

/// Which mipmap generation path to use. `Auto` picks from the device
/// capabilities; anything else forces that path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MipmapPreference {
    #[default]
    Auto,
    Framebuffer,
    Sampler,
    Host,
}

impl fmt::Display for MipmapPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MipmapPreference::Auto => write!(f, "auto"),
            MipmapPreference::Framebuffer => write!(f, "framebuffer"),
            MipmapPreference::Sampler => write!(f, "sampler"),
            MipmapPreference::Host => write!(f, "host"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub timeout_ms: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            timeout_ms: STATUS_TIMEOUT_MS,
        }
    }
}
