pub mod buffer;
pub mod config;
pub mod consts;
pub mod controller;
pub mod error;
pub mod gpu;
pub mod io;
#[cfg(feature = "gpu")]
pub mod render;
pub mod tonemap;
pub mod view;
pub mod viewer;
