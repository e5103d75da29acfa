pub mod bitmap;
pub mod loader;
pub mod openexr;
pub mod raw;

pub use bitmap::BitmapDecoder;
pub use loader::{DecodeStrategy, ImageLoader};
pub use openexr::ExrDecoder;
pub use raw::{parse_pixel_map, RawDecoder};
