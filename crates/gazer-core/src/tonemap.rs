use crate::config::TonemapConfig;

/// WGSL source of the default tone-mapping function,
/// `fn tonemap(color: vec3<f32>, exposure: f32) -> vec3<f32>`.
pub const TONEMAP_WGSL: &str = include_str!("shaders/tonemap.wgsl");

/// Whether the tonemap shader runs, and with which exposure.
#[derive(Clone, Debug, PartialEq)]
pub struct TonemapState {
    pub enabled: bool,
    pub exposure: f32,
    step: f32,
    min: f32,
    max: f32,
}

impl TonemapState {
    pub fn new(config: &TonemapConfig) -> Self {
        Self {
            enabled: config.enabled,
            exposure: config.exposure.clamp(config.min_exposure, config.max_exposure),
            step: config.exposure_step,
            min: config.min_exposure,
            max: config.max_exposure,
        }
    }

    /// Flip between enabled and disabled, returning the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Move exposure by `steps` increments, clamped to the configured range.
    pub fn adjust_exposure(&mut self, steps: i32) -> f32 {
        self.exposure = (self.exposure + steps as f32 * self.step).clamp(self.min, self.max);
        self.exposure
    }
}

impl Default for TonemapState {
    fn default() -> Self {
        Self::new(&TonemapConfig::default())
    }
}

/// CPU version of the default shader function.
pub fn tonemap_exposure(rgb: [f32; 3], exposure: f32) -> [f32; 3] {
    rgb.map(|c| 1.0 - (-c * exposure).exp())
}
