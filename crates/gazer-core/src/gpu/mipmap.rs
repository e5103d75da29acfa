//! Host-side mip chain construction.
//!
//! All levels live in one reusable float buffer. After an upload the buffer
//! is cleared but keeps its capacity, so repeated loads of similar-sized
//! images do not go back to the allocator.

use std::ops::Range;

use half::f16;

use crate::buffer::{reverse_rows, ImageBuffer};
use crate::consts::TEXTURE_CHANNELS;

/// Location of one level inside [`MipScratch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub range: Range<usize>,
}

/// Reusable scratch memory for host mipmap building and half-float
/// conversion.
#[derive(Default)]
pub struct MipScratch {
    texels: Vec<f32>,
    half: Vec<f16>,
    levels: Vec<MipLevel>,
}

impl MipScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `image` into the scratch as RGBA floats, mirroring rows when the
    /// image is flagged for a flip, then build `mip_levels` levels.
    pub fn build(&mut self, image: &ImageBuffer, mip_levels: u32) -> &[MipLevel] {
        self.clear();
        image.extend_rgba_f32(&mut self.texels);
        if image.flip_y {
            reverse_rows(&mut self.texels, image.width() as usize * TEXTURE_CHANNELS);
        }

        let (mut w, mut h) = (image.width(), image.height());
        self.levels.push(MipLevel {
            width: w,
            height: h,
            range: 0..self.texels.len(),
        });

        for _ in 1..mip_levels {
            let src = self.levels[self.levels.len() - 1].clone();
            let (dw, dh) = ((w / 2).max(1), (h / 2).max(1));
            let start = self.texels.len();
            for y in 0..dh {
                for x in 0..dw {
                    let texel = box_filter(&self.texels[src.range.clone()], w, h, x, y);
                    self.texels.extend_from_slice(&texel);
                }
            }
            self.levels.push(MipLevel {
                width: dw,
                height: dh,
                range: start..self.texels.len(),
            });
            w = dw;
            h = dh;
        }

        &self.levels
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    /// Half-float copy of one built level.
    pub fn level_f16(&mut self, index: usize) -> &[f16] {
        let range = self.levels[index].range.clone();
        self.half.clear();
        self.half
            .extend(self.texels[range].iter().map(|&v| f16::from_f32(v)));
        &self.half
    }

    /// Half-float copy of an image's base level, rows in storage order.
    pub fn base_f16(&mut self, image: &ImageBuffer) -> &[f16] {
        self.clear();
        image.extend_rgba_f32(&mut self.texels);
        self.half
            .extend(self.texels.iter().map(|&v| f16::from_f32(v)));
        &self.half
    }

    /// Drop the contents but keep the allocations.
    pub fn clear(&mut self) {
        self.texels.clear();
        self.half.clear();
        self.levels.clear();
    }

    pub fn capacity(&self) -> usize {
        self.texels.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty() && self.half.is_empty()
    }
}

/// Average the 2x2 source block under destination texel (x, y), clamping at
/// the edges of odd-sized levels.
fn box_filter(src: &[f32], w: u32, h: u32, x: u32, y: u32) -> [f32; 4] {
    let (w, h) = (w as usize, h as usize);
    let x0 = (x as usize * 2).min(w - 1);
    let y0 = (y as usize * 2).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);

    let mut out = [0.0f32; 4];
    for &(sx, sy) in &[(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
        let idx = (sy * w + sx) * TEXTURE_CHANNELS;
        for c in 0..TEXTURE_CHANNELS {
            out[c] += src[idx + c] * 0.25;
        }
    }
    out
}

/// Build levels 1.. from an RGBA half-float base level.
pub fn downsample_chain(base: &[f16], width: u32, height: u32, mip_levels: u32) -> Vec<Vec<f16>> {
    let mut levels = Vec::with_capacity(mip_levels.saturating_sub(1) as usize);
    let mut src: Vec<f32> = base.iter().map(|v| v.to_f32()).collect();
    let (mut w, mut h) = (width, height);

    for _ in 1..mip_levels {
        let (dw, dh) = ((w / 2).max(1), (h / 2).max(1));
        let mut dst = Vec::with_capacity(dw as usize * dh as usize * TEXTURE_CHANNELS);
        for y in 0..dh {
            for x in 0..dw {
                dst.extend_from_slice(&box_filter(&src, w, h, x, y));
            }
        }
        levels.push(dst.iter().map(|&v| f16::from_f32(v)).collect());
        src = dst;
        w = dw;
        h = dh;
    }

    levels
}
