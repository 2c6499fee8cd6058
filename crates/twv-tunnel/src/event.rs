//! Immutable tunnel event messages.

use crate::client::TunnelEvents;
use std::fmt;

/// One tunnel lifecycle callback captured as a value.
///
/// Used wherever events cross from a library context to a consumer queue
/// instead of being delivered by direct call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelEvent {
    /// Diagnostic notice
    DiagnosticMessage(String),
    /// Available egress regions, in library order
    AvailableEgressRegions(Vec<String>),
    /// Local SOCKS proxy port
    ListeningSocksProxyPort(u16),
    /// Local HTTP proxy port
    ListeningHttpProxyPort(u16),
    /// Establishment started
    Connecting,
    /// Tunnel established
    Connected,
    /// Traffic counters
    BytesTransferred { sent: u64, received: u64 },
    /// Apparent client region
    ClientRegion(String),
}

impl TunnelEvent {
    /// Deliver this event to `sink` through the matching callback.
    pub fn dispatch(&self, sink: &dyn TunnelEvents) {
        match self {
            Self::DiagnosticMessage(message) => sink.on_diagnostic_message(message),
            Self::AvailableEgressRegions(regions) => sink.on_available_egress_regions(regions),
            Self::ListeningSocksProxyPort(port) => sink.on_listening_socks_proxy_port(*port),
            Self::ListeningHttpProxyPort(port) => sink.on_listening_http_proxy_port(*port),
            Self::Connecting => sink.on_connecting(),
            Self::Connected => sink.on_connected(),
            Self::BytesTransferred { sent, received } => {
                sink.on_bytes_transferred(*sent, *received)
            }
            Self::ClientRegion(region) => sink.on_client_region(region),
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DiagnosticMessage(_) => "diagnostic-message",
            Self::AvailableEgressRegions(_) => "available-egress-regions",
            Self::ListeningSocksProxyPort(_) => "listening-socks-proxy-port",
            Self::ListeningHttpProxyPort(_) => "listening-http-proxy-port",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::BytesTransferred { .. } => "bytes-transferred",
            Self::ClientRegion(_) => "client-region",
        }
    }
}

impl fmt::Display for TunnelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiagnosticMessage(message) => write!(f, "{}", message),
            Self::AvailableEgressRegions(regions) => {
                write!(f, "available egress regions: {}", regions.join(", "))
            }
            Self::ListeningSocksProxyPort(port) => {
                write!(f, "local SOCKS proxy listening on port: {}", port)
            }
            Self::ListeningHttpProxyPort(port) => {
                write!(f, "local HTTP proxy listening on port: {}", port)
            }
            Self::Connecting => write!(f, "connecting..."),
            Self::Connected => write!(f, "connected"),
            Self::BytesTransferred { sent, received } => {
                write!(f, "bytes sent: {}, bytes received: {}", sent, received)
            }
            Self::ClientRegion(region) => write!(f, "client region: {}", region),
        }
    }
}
