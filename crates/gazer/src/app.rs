use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use gazer_core::config::GazerConfig;
use gazer_core::controller::InputEvent;
use gazer_core::gpu::wgpu_backend::WgpuBackend;
use gazer_core::render::Renderer;
use gazer_core::viewer::Viewer;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoopProxy};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

use crate::file_list::FileList;
use crate::host::{HostEvent, ProxyHost};

/// Pixel scroll distance treated as one wheel notch.
const PIXELS_PER_NOTCH: f64 = 120.0;

struct Graphics {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: Arc<wgpu::Device>,
    renderer: Renderer,
}

pub struct GazerApp {
    config: GazerConfig,
    proxy: EventLoopProxy<HostEvent>,
    files: FileList,
    /// File whose image is on screen; only changes when a load succeeds.
    shown: Option<PathBuf>,
    gfx: Option<Graphics>,
    viewer: Option<Viewer<ProxyHost>>,
    modifiers: ModifiersState,
    cursor: [f32; 2],
    scroll: f64,
    status: Option<(String, Instant)>,
}

impl GazerApp {
    pub fn new(config: GazerConfig, files: FileList, proxy: EventLoopProxy<HostEvent>) -> Self {
        Self {
            config,
            proxy,
            files,
            shown: None,
            gfx: None,
            viewer: None,
            modifiers: ModifiersState::empty(),
            cursor: [0.0, 0.0],
            scroll: 0.0,
            status: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("Gazer")
                        .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 768.0)),
                )
                .context("Failed to create window")?,
        );

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("No suitable GPU adapter found")?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gazer"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            ..Default::default()
        }))
        .context("Failed to create GPU device")?;
        let (device, queue) = (Arc::new(device), Arc::new(queue));

        // Tonemapped values go to the display as is, without an sRGB encode.
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no formats")?;
        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let backend = WgpuBackend::from_device(&adapter, device.clone(), queue.clone());
        let mut renderer = Renderer::new(device.clone(), queue, format);
        renderer.resize(surface_config.width, surface_config.height);

        let mut viewer = Viewer::new(
            &self.config,
            Box::new(backend),
            ProxyHost::new(self.proxy.clone()),
        );
        viewer.resize(surface_config.width, surface_config.height);

        info!(format = ?format, width = size.width, height = size.height, "Window ready");
        self.viewer = Some(viewer);
        self.gfx = Some(Graphics {
            window,
            surface,
            surface_config,
            device,
            renderer,
        });
        Ok(())
    }

    fn load_current(&mut self) {
        let Some(path) = self.files.current().map(Path::to_path_buf) else {
            return;
        };
        if let Some(viewer) = self.viewer.as_mut() {
            // Failures were already reported through the status line.
            if viewer.load_path(&path).is_ok() {
                self.shown = Some(path);
            }
        }
        self.update_title();
    }

    fn update_title(&self) {
        let Some(gfx) = &self.gfx else {
            return;
        };
        let status = self.status.as_ref().map(|(text, _)| text.as_str());
        gfx.window
            .set_title(&window_title(self.shown.as_deref(), status));
    }

    fn open_dialog(&self) {
        let proxy = self.proxy.clone();
        std::thread::spawn(move || {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Images", &["exr", "png", "jpg", "jpeg", "tif", "tiff", "hdr"])
                .add_filter("All files", &["*"])
                .pick_file()
            {
                let _ = proxy.send_event(HostEvent::Open(path));
            }
        });
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        gfx.surface_config.width = width.max(1);
        gfx.surface_config.height = height.max(1);
        gfx.surface.configure(&gfx.device, &gfx.surface_config);
        gfx.renderer
            .resize(gfx.surface_config.width, gfx.surface_config.height);
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.resize(gfx.surface_config.width, gfx.surface_config.height);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gfx), Some(viewer)) = (self.gfx.as_mut(), self.viewer.as_ref()) else {
            return;
        };
        let frame = match gfx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gfx.surface.configure(&gfx.device, &gfx.surface_config);
                gfx.window.request_redraw();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Surface out of memory");
                event_loop.exit();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Frame skipped");
                return;
            }
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        match gfx
            .renderer
            .render(&target, viewer.texture(), viewer.view(), viewer.tonemap())
        {
            Ok(()) => {
                gfx.window.pre_present_notify();
                frame.present();
            }
            Err(e) => warn!(error = %e, "Frame skipped"),
        }
    }

    fn key_pressed(&mut self, event_loop: &ActiveEventLoop, key: Key<&str>) {
        let control = self.modifiers.control_key();
        match key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character("q" | "Q") if control => event_loop.exit(),
            Key::Character("o" | "O") if control => self.open_dialog(),
            Key::Character(text) if !control => {
                if let Some(viewer) = self.viewer.as_mut() {
                    for c in text.chars() {
                        viewer.handle_event(InputEvent::Key(c));
                    }
                }
            }
            _ => {}
        }
    }

    fn wheel_steps(&mut self, delta: MouseScrollDelta) -> i32 {
        match delta {
            MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
            MouseScrollDelta::PixelDelta(pos) => {
                self.scroll += pos.y;
                let steps = (self.scroll / PIXELS_PER_NOTCH).trunc();
                self.scroll -= steps * PIXELS_PER_NOTCH;
                steps as i32
            }
        }
    }
}

impl ApplicationHandler<HostEvent> for GazerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        if let Err(e) = self.init_graphics(event_loop) {
            error!("{e:#}");
            event_loop.exit();
            return;
        }
        self.load_current();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.key_pressed(event_loop, event.logical_key.as_ref());
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [position.x as f32, position.y as f32];
                if let Some(viewer) = self.viewer.as_mut() {
                    let [x, y] = self.cursor;
                    viewer.handle_event(InputEvent::PointerMove { x, y });
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let [x, y] = self.cursor;
                let input = match state {
                    ElementState::Pressed => InputEvent::PointerDown { x, y },
                    ElementState::Released => InputEvent::PointerUp,
                };
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.handle_event(input);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = self.wheel_steps(delta);
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.handle_event(InputEvent::Wheel { steps });
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: HostEvent) {
        match event {
            HostEvent::Status { text, timeout_ms } => {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
                info!(message = %text, "Status");
                self.status = Some((text, deadline));
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
                self.update_title();
            }
            HostEvent::Navigate(steps) => {
                if self.files.advance(steps).is_some() {
                    self.load_current();
                }
            }
            HostEvent::Repaint => {
                if let Some(gfx) = &self.gfx {
                    gfx.window.request_redraw();
                }
            }
            HostEvent::Open(path) => {
                if let Err(e) = self.files.open(&path) {
                    warn!(path = %path.display(), error = %e, "Could not list directory");
                    return;
                }
                self.load_current();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some((_, deadline)) = &self.status {
            if Instant::now() >= *deadline {
                self.status = None;
                event_loop.set_control_flow(ControlFlow::Wait);
                self.update_title();
            }
        }
    }
}

/// `<file name> - Gazer`, with any live status message appended.
fn window_title(shown: Option<&Path>, status: Option<&str>) -> String {
    let mut title = match shown.and_then(Path::file_name) {
        Some(name) => format!("{} - Gazer", name.to_string_lossy()),
        None => "Gazer".to_string(),
    };
    if let Some(text) = status {
        title.push_str(&format!("  ({text})"));
    }
    title
}
