//! The viewer core: one loader, one uploader, the current texture and the
//! interaction state, all driven from the host's event loop.

use std::path::Path;

use tracing::{info, warn};

use crate::buffer::ImageBuffer;
use crate::config::GazerConfig;
use crate::controller::{InputEvent, InteractionController, ViewerHost};
use crate::error::Result;
use crate::gpu::{GpuTexture, TextureBackend, TextureUploader};
use crate::io::ImageLoader;
use crate::tonemap::TonemapState;
use crate::view::ViewState;

pub struct Viewer<H: ViewerHost> {
    host: H,
    loader: ImageLoader,
    uploader: TextureUploader,
    backend: Box<dyn TextureBackend>,
    texture: Option<GpuTexture>,
    view: ViewState,
    tonemap: TonemapState,
    controller: InteractionController,
    status_timeout_ms: u32,
}

impl<H: ViewerHost> Viewer<H> {
    pub fn new(config: &GazerConfig, backend: Box<dyn TextureBackend>, host: H) -> Self {
        let uploader = TextureUploader::new(backend.as_ref(), config.render.mipmap);
        Self {
            host,
            loader: ImageLoader::new(&config.raw_decoder),
            uploader,
            backend,
            texture: None,
            view: ViewState::new(&config.view),
            tonemap: TonemapState::new(&config.tonemap),
            controller: InteractionController::new(config.status.timeout_ms),
            status_timeout_ms: config.status.timeout_ms,
        }
    }

    /// Decode and display `path`. On failure the host gets a status message
    /// and the current image stays on screen.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let result = self
            .loader
            .load(path)
            .and_then(|image| self.load_image(image));

        if let Err(e) = &result {
            warn!(path = %path.display(), error = %e, "Load failed");
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            self.host
                .status_message(&format!("Could not open {name}: {e}"), self.status_timeout_ms);
        }
        result
    }

    /// Upload an already decoded image and make it current. Pan and zoom
    /// are kept; centering follows the new image size.
    pub fn load_image(&mut self, mut image: ImageBuffer) -> Result<()> {
        let texture = self
            .uploader
            .upload(self.backend.as_ref(), &mut image)
            .inspect_err(|e| warn!(error = %e, "Texture upload failed, keeping previous image"))?;

        info!(
            id = texture.id,
            width = texture.width,
            height = texture.height,
            flip_y = texture.flip_y,
            "Image ready"
        );
        self.view
            .set_image(texture.width, texture.height, texture.flip_y);
        self.texture = Some(texture);
        self.host.request_repaint();
        Ok(())
    }

    /// Feed one input event to the interaction controller.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        self.controller
            .handle(event, &mut self.view, &mut self.tonemap, &mut self.host)
    }

    /// The drawable area changed size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.view.center_in([width, height]);
        self.host.request_repaint();
    }

    pub fn texture(&self) -> Option<&GpuTexture> {
        self.texture.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn tonemap(&self) -> &TonemapState {
        &self.tonemap
    }

    pub fn uploader(&self) -> &TextureUploader {
        &self.uploader
    }

    pub fn backend(&self) -> &dyn TextureBackend {
        self.backend.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
