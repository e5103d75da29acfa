/// Default exposure multiplier fed to the tonemap shader.
pub const DEFAULT_EXPOSURE: f32 = 1.1;

/// Exposure change per key press.
pub const EXPOSURE_STEP: f32 = 0.1;

/// Zoom change per key press.
pub const ZOOM_STEP: f32 = 0.1;

/// Zoom bounds.
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 20.0;

/// Exposure bounds.
pub const MIN_EXPOSURE: f32 = 0.0;
pub const MAX_EXPOSURE: f32 = 64.0;

/// How long transient status messages stay visible.
pub const STATUS_TIMEOUT_MS: u32 = 2_000;

/// OpenEXR magic number (first four bytes of every file).
pub const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

/// Case-sensitive extension routed to the EXR decoder.
pub const EXR_EXTENSION: &str = "exr";

/// Magic token of the binary RGB pixel map emitted by the raw decoder.
pub const PIXMAP_MAGIC: &str = "P6";

/// Full-scale sample value the raw decoder must declare in 16-bit mode.
pub const PIXMAP_MAX_16BIT: u32 = 65_535;

/// Number of interleaved channels in the raw decoder output.
pub const PIXMAP_CHANNELS: usize = 3;

/// Default external raw decoder and its arguments.
pub const RAW_DECODER_PROGRAM: &str = "dcraw";
pub const RAW_IDENTIFY_ARGS: &[&str] = &["-i"];
/// Write to stdout, use camera white balance, 16 bits per sample.
pub const RAW_DECODE_ARGS: &[&str] = &["-c", "-w", "-6"];

/// Channels per texel in the uploaded texture.
pub const TEXTURE_CHANNELS: usize = 4;
