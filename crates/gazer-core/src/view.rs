use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector3};

use crate::config::ViewConfig;
use crate::tonemap::TonemapState;

/// Pan / zoom state of the image quad, in window pixels with the origin at
/// the bottom-left.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Screen position of the image centre.
    pub pan: [f32; 2],
    pub zoom: f32,
    /// Mirror texture rows when drawing.
    pub flip_y: bool,
    /// Native size of the displayed image.
    pub image_size: [f32; 2],
    moved: bool,
    zoom_step: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl ViewState {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            pan: [0.0, 0.0],
            zoom: 1.0,
            flip_y: false,
            image_size: [0.0, 0.0],
            moved: false,
            zoom_step: config.zoom_step,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    /// Adopt a new image. Pan and zoom carry over from the previous one.
    pub fn set_image(&mut self, width: u32, height: u32, flip_y: bool) {
        self.image_size = [width as f32, height as f32];
        self.flip_y = flip_y;
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan[0] += dx;
        self.pan[1] += dy;
        self.moved = true;
    }

    /// Centre the image in a new viewport, unless the user already moved it.
    pub fn center_in(&mut self, viewport: [u32; 2]) {
        if !self.moved {
            self.pan = [viewport[0] as f32 / 2.0, viewport[1] as f32 / 2.0];
        }
    }

    /// Change zoom by `steps` increments, clamped to the configured range.
    pub fn zoom_by(&mut self, steps: i32) -> f32 {
        self.zoom = (self.zoom + steps as f32 * self.zoom_step).clamp(self.min_zoom, self.max_zoom);
        self.zoom
    }

    /// Offset that puts the image centre at the pan position.
    pub fn centering_offset(&self) -> [f32; 2] {
        [self.image_size[0] / 2.0, self.image_size[1] / 2.0]
    }

    /// translate(pan) * scale(zoom) * translate(-size / 2).
    pub fn quad_transform(&self) -> Matrix4<f32> {
        let [cx, cy] = self.centering_offset();
        Matrix4::from_translation(Vector3::new(self.pan[0], self.pan[1], 0.0))
            * Matrix4::from_nonuniform_scale(self.zoom, self.zoom, 1.0)
            * Matrix4::from_translation(Vector3::new(-cx, -cy, 0.0))
    }

    /// Texture coordinate transform; mirrors v when the image is flipped.
    pub fn texcoord_transform(&self) -> Matrix4<f32> {
        if self.flip_y {
            Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0))
                * Matrix4::from_nonuniform_scale(1.0, -1.0, 1.0)
        } else {
            Matrix4::from_scale(1.0)
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&ViewConfig::default())
    }
}

/// 1:1 pixel orthographic projection, origin bottom-left.
pub fn projection(viewport: [u32; 2]) -> Matrix4<f32> {
    cgmath::ortho(
        0.0,
        viewport[0].max(1) as f32,
        0.0,
        viewport[1].max(1) as f32,
        1.0,
        -1.0,
    )
}

/// Per-frame uniform block; layout matches `Frame` in `quad.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub texcoord: [[f32; 4]; 4],
    pub size: [f32; 2],
    pub exposure: f32,
    pub _pad: f32,
}

impl FrameUniforms {
    pub fn new(view: &ViewState, tonemap: &TonemapState, viewport: [u32; 2]) -> Self {
        Self {
            projection: projection(viewport).into(),
            model: view.quad_transform().into(),
            texcoord: view.texcoord_transform().into(),
            size: view.image_size,
            exposure: tonemap.exposure,
            _pad: 0.0,
        }
    }
}
