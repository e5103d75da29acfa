use std::path::Path;

use tracing::{debug, info};

use crate::buffer::ImageBuffer;
use crate::config::RawDecoderConfig;
use crate::error::{GazerError, Result};

use super::{BitmapDecoder, ExrDecoder, RawDecoder};

/// One way of turning a file into an [`ImageBuffer`].
///
/// `Ok(None)` means the strategy does not apply to this file and the next
/// one should be tried. An error is final for the current load.
pub trait DecodeStrategy {
    fn name(&self) -> &'static str;

    fn try_decode(&self, path: &Path) -> Result<Option<ImageBuffer>>;
}

/// Ordered list of decode strategies; the first one that produces an image
/// wins.
pub struct ImageLoader {
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl ImageLoader {
    /// EXR first, then the raw camera decoder, then the generic bitmap codecs.
    pub fn new(raw: &RawDecoderConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(ExrDecoder),
            Box::new(RawDecoder::new(raw.clone())),
            Box::new(BitmapDecoder),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DecodeStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decode `path` with the first applicable strategy.
    pub fn load(&self, path: &Path) -> Result<ImageBuffer> {
        for strategy in &self.strategies {
            match strategy.try_decode(path) {
                Ok(Some(image)) => {
                    info!(
                        path = %path.display(),
                        strategy = strategy.name(),
                        width = image.width(),
                        height = image.height(),
                        bit_depth = image.bit_depth(),
                        flip_y = image.flip_y,
                        "Image decoded"
                    );
                    return Ok(image);
                }
                Ok(None) => {
                    debug!(path = %path.display(), strategy = strategy.name(), "Not applicable");
                }
                Err(e) if e.is_not_applicable() => {
                    debug!(path = %path.display(), strategy = strategy.name(), error = %e, "Skipped");
                }
                Err(e) => return Err(e),
            }
        }

        Err(GazerError::Decode(format!(
            "no decoder accepted {}",
            path.display()
        )))
    }
}
