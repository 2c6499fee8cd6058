//! Messages delivered to the UI context.

use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU16, Ordering};
use tracing::trace;
use twv_tunnel::{TunnelEvent, TunnelEvents};

/// Messages posted onto a screen's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    /// A tunnel lifecycle event, forwarded from a library context
    Tunnel(TunnelEvent),
}

/// User actions delivered to the UI runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Restart the tunnel and recreate the screen
    Restart,
    /// Leave the UI loop
    Quit,
}

/// Library-facing half of a screen.
///
/// Called on whatever thread the tunnel library uses; it never touches UI
/// state, it only records the HTTP proxy port and posts an immutable
/// message to the screen's queue.
pub struct EventPoster {
    /// Last published HTTP proxy port (0 until one is known)
    http_proxy_port: AtomicU16,
    /// Queue owned by the UI context
    tx: Sender<UiMessage>,
}

impl EventPoster {
    /// Create a poster feeding `tx`
    pub fn new(tx: Sender<UiMessage>) -> Self {
        Self {
            http_proxy_port: AtomicU16::new(0),
            tx,
        }
    }

    /// Last HTTP proxy port published by the tunnel
    pub fn http_proxy_port(&self) -> u16 {
        self.http_proxy_port.load(Ordering::Acquire)
    }

    fn post(&self, event: TunnelEvent) {
        trace!("Posting {} to UI", event.kind());
        // Receiver gone means the screen is being torn down
        let _ = self.tx.send(UiMessage::Tunnel(event));
    }
}

impl TunnelEvents for EventPoster {
    fn on_diagnostic_message(&self, message: &str) {
        self.post(TunnelEvent::DiagnosticMessage(message.to_string()));
    }

    fn on_available_egress_regions(&self, regions: &[String]) {
        self.post(TunnelEvent::AvailableEgressRegions(regions.to_vec()));
    }

    fn on_listening_socks_proxy_port(&self, port: u16) {
        self.post(TunnelEvent::ListeningSocksProxyPort(port));
    }

    fn on_listening_http_proxy_port(&self, port: u16) {
        self.http_proxy_port.store(port, Ordering::Release);
        self.post(TunnelEvent::ListeningHttpProxyPort(port));
    }

    fn on_connecting(&self) {
        self.post(TunnelEvent::Connecting);
    }

    fn on_connected(&self) {
        self.post(TunnelEvent::Connected);
    }

    fn on_bytes_transferred(&self, sent: u64, received: u64) {
        self.post(TunnelEvent::BytesTransferred { sent, received });
    }

    fn on_client_region(&self, region: &str) {
        self.post(TunnelEvent::ClientRegion(region.to_string()));
    }
}
