//! Raw camera files, decoded by an external command-line tool.
//!
//! The tool is run twice: once in identify mode (exit status 0 means the
//! file is a raw it understands) and once in decode mode, where it writes a
//! 16-bit binary RGB pixel map to stdout:
//!
//! ```text
//! P6
//! <width> <height>
//! 65535
//! <width * height * 3 big-endian u16 samples>
//! ```

use std::io::{BufRead, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, warn};

use crate::buffer::{ImageBuffer, PixelData};
use crate::config::RawDecoderConfig;
use crate::consts::{PIXMAP_CHANNELS, PIXMAP_MAGIC, PIXMAP_MAX_16BIT};
use crate::error::{GazerError, Result};

use super::DecodeStrategy;

pub struct RawDecoder {
    config: RawDecoderConfig,
}

impl RawDecoder {
    pub fn new(config: RawDecoderConfig) -> Self {
        Self { config }
    }

    /// Ask the decoder whether it recognises `path`.
    pub fn identify(&self, path: &Path) -> Result<()> {
        let status = Command::new(&self.config.program)
            .args(&self.config.identify_args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                GazerError::SubprocessUnavailable(format!("{}: {e}", self.config.program))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(GazerError::SubprocessUnavailable(format!(
                "{} does not recognise {} ({status})",
                self.config.program,
                path.display()
            )))
        }
    }

    /// Run the decoder and parse the pixel map it writes to stdout.
    /// Blocks until the process exits.
    pub fn decode(&self, path: &Path) -> Result<ImageBuffer> {
        let output = Command::new(&self.config.program)
            .args(&self.config.decode_args)
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                GazerError::SubprocessUnavailable(format!("{}: {e}", self.config.program))
            })?;

        if !output.status.success() {
            return Err(GazerError::Format(format!(
                "{} failed on {} ({})",
                self.config.program,
                path.display(),
                output.status
            )));
        }

        parse_pixel_map(output.stdout.as_slice())
    }
}

impl DecodeStrategy for RawDecoder {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn try_decode(&self, path: &Path) -> Result<Option<ImageBuffer>> {
        if let Err(e) = self.identify(path) {
            debug!(path = %path.display(), error = %e, "Raw decoder declined");
            return Ok(None);
        }
        match self.decode(path) {
            Ok(image) => Ok(Some(image)),
            Err(e) if e.is_not_applicable() => {
                warn!(path = %path.display(), error = %e, "Raw decoder vanished after identify");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse a 16-bit binary RGB pixel map, converting samples to native order.
pub fn parse_pixel_map<R: BufRead>(mut reader: R) -> Result<ImageBuffer> {
    let magic = read_token(&mut reader)?;
    if magic != PIXMAP_MAGIC {
        return Err(GazerError::Format(format!(
            "expected pixel map magic {PIXMAP_MAGIC:?}, got {magic:?}"
        )));
    }

    let width = read_number(&mut reader, "width")?;
    let height = read_number(&mut reader, "height")?;
    let max_value = read_number(&mut reader, "maximum sample value")?;
    if max_value != PIXMAP_MAX_16BIT {
        return Err(GazerError::Format(format!(
            "expected maximum sample value {PIXMAP_MAX_16BIT}, got {max_value}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(GazerError::InvalidDimensions { width, height });
    }

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(PIXMAP_CHANNELS * 2))
        .ok_or(GazerError::InvalidDimensions { width, height })?;

    let mut payload = Vec::with_capacity(expected);
    reader.read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(GazerError::Format(format!(
            "{width}x{height} pixel map needs {expected} bytes of samples, read {}",
            payload.len()
        )));
    }

    let mut samples = vec![0u16; expected / 2];
    BigEndian::read_u16_into(&payload, &mut samples);

    ImageBuffer::new(width, height, PixelData::Rgb16(samples), true)
}

/// Read one whitespace-delimited header token and consume the single
/// whitespace byte that ends it.
fn read_token<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut token = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if reader.read(&mut byte)? == 0 {
            break;
        }
        if byte[0].is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }
        token.push(byte[0]);
    }
    if token.is_empty() {
        return Err(GazerError::Format("truncated pixel map header".into()));
    }
    String::from_utf8(token).map_err(|_| GazerError::Format("non-ASCII pixel map header".into()))
}

fn read_number<R: BufRead>(reader: &mut R, what: &str) -> Result<u32> {
    let token = read_token(reader)?;
    token
        .parse()
        .map_err(|_| GazerError::Format(format!("invalid {what} {token:?} in pixel map header")))
}
