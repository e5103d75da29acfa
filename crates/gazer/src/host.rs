use std::path::PathBuf;

use gazer_core::controller::ViewerHost;
use winit::event_loop::EventLoopProxy;

/// Requests from the viewer core (and the file dialog thread) back to the
/// event loop.
#[derive(Debug)]
pub enum HostEvent {
    Status { text: String, timeout_ms: u32 },
    Navigate(i32),
    Repaint,
    Open(PathBuf),
}

/// `ViewerHost` that forwards every request to the event loop as a user
/// event.
pub struct ProxyHost {
    proxy: EventLoopProxy<HostEvent>,
}

impl ProxyHost {
    pub fn new(proxy: EventLoopProxy<HostEvent>) -> Self {
        Self { proxy }
    }

    fn send(&self, event: HostEvent) {
        if self.proxy.send_event(event).is_err() {
            tracing::debug!("Event loop closed, dropping host event");
        }
    }
}

impl ViewerHost for ProxyHost {
    fn status_message(&mut self, text: &str, timeout_ms: u32) {
        self.send(HostEvent::Status {
            text: text.to_string(),
            timeout_ms,
        });
    }

    fn navigate(&mut self, steps: i32) {
        self.send(HostEvent::Navigate(steps));
    }

    fn request_repaint(&mut self) {
        self.send(HostEvent::Repaint);
    }
}
