//! Input handling: turns pointer, wheel and key events into view and
//! tonemap changes, and into requests to the host.

use tracing::debug;

use crate::tonemap::TonemapState;
use crate::view::ViewState;

/// A discrete input event in window coordinates (origin top-left, y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    /// Signed wheel notches; positive is away from the user.
    Wheel { steps: i32 },
    Key(char),
}

/// Callbacks from the viewer core to whatever embeds it.
pub trait ViewerHost {
    fn status_message(&mut self, text: &str, timeout_ms: u32);

    /// Move `steps` entries through the host's file list.
    fn navigate(&mut self, steps: i32);

    fn request_repaint(&mut self);
}

pub struct InteractionController {
    anchor: Option<[f32; 2]>,
    status_timeout_ms: u32,
}

impl InteractionController {
    pub fn new(status_timeout_ms: u32) -> Self {
        Self {
            anchor: None,
            status_timeout_ms,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Apply one event. Returns false when the event was ignored.
    pub fn handle(
        &mut self,
        event: InputEvent,
        view: &mut ViewState,
        tonemap: &mut TonemapState,
        host: &mut dyn ViewerHost,
    ) -> bool {
        let handled = match event {
            InputEvent::PointerDown { x, y } => {
                self.anchor = Some([x, -y]);
                true
            }
            InputEvent::PointerMove { x, y } => match self.anchor {
                Some([ax, ay]) => {
                    let (x, y) = (x, -y);
                    view.pan_by(x - ax, y - ay);
                    self.anchor = Some([x, y]);
                    true
                }
                None => false,
            },
            InputEvent::PointerUp => self.anchor.take().is_some(),
            InputEvent::Wheel { steps: 0 } => false,
            InputEvent::Wheel { steps } => {
                host.navigate(-steps);
                true
            }
            InputEvent::Key(key) => self.handle_key(key, view, tonemap, host),
        };

        if handled {
            host.request_repaint();
        }
        handled
    }

    fn handle_key(
        &mut self,
        key: char,
        view: &mut ViewState,
        tonemap: &mut TonemapState,
        host: &mut dyn ViewerHost,
    ) -> bool {
        let message = match key {
            '-' => zoom_message(view.zoom_by(-1)),
            '+' | '=' => zoom_message(view.zoom_by(1)),
            's' | 'S' => {
                if tonemap.toggle() {
                    "Shader enabled".to_string()
                } else {
                    "Shader disabled".to_string()
                }
            }
            '[' | ']' if !tonemap.enabled => {
                debug!(key = %key, "Exposure change ignored, shader disabled");
                return true;
            }
            '[' => exposure_message(tonemap.adjust_exposure(-1)),
            ']' => exposure_message(tonemap.adjust_exposure(1)),
            _ => return false,
        };
        host.status_message(&message, self.status_timeout_ms);
        true
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(crate::consts::STATUS_TIMEOUT_MS)
    }
}

fn zoom_message(zoom: f32) -> String {
    format!("Zoom: {:.0}%", zoom * 100.0)
}

fn exposure_message(exposure: f32) -> String {
    format!("Exposure: {exposure:.1}")
}
