//! Tunnel client capability
//!
//! The tunnel library is an external collaborator. It is modelled as two
//! traits: [`TunnelClient`] for the operations the host invokes, and
//! [`TunnelEvents`] for the callbacks the library invokes on execution
//! contexts it controls.

/// Operations the host can request from the tunnel client.
///
/// None of these block until the tunnel is established; progress is reported
/// later through [`TunnelEvents`].
pub trait TunnelClient: Send + Sync {
    /// Begin establishing the tunnel.
    ///
    /// An empty `config_override` means the client asks its host for the
    /// configuration via [`TunnelHost::tunnel_config`].
    fn start(&self, config_override: &str) -> Result<(), TunnelError>;

    /// Tear down the tunnel. Safe to call when never started.
    fn stop(&self);

    /// Tear down and re-establish the tunnel.
    fn restart(&self) -> Result<(), TunnelError>;
}

/// Lifecycle callbacks emitted by the tunnel client.
///
/// Implementations must tolerate being called from any thread, concurrently
/// with each other.
pub trait TunnelEvents: Send + Sync {
    /// Free-form diagnostic notice from the library.
    fn on_diagnostic_message(&self, message: &str);

    /// Egress regions the tunnel can exit from, in library order.
    fn on_available_egress_regions(&self, regions: &[String]);

    /// Local SOCKS proxy is listening.
    fn on_listening_socks_proxy_port(&self, port: u16);

    /// Local HTTP proxy is listening.
    fn on_listening_http_proxy_port(&self, port: u16);

    /// Tunnel establishment has begun.
    fn on_connecting(&self);

    /// Tunnel is up; traffic through the local proxies now egresses.
    fn on_connected(&self);

    /// Cumulative traffic counters.
    fn on_bytes_transferred(&self, sent: u64, received: u64);

    /// Region the client appears to be in.
    fn on_client_region(&self, region: &str);
}

/// The host side of the tunnel contract: callbacks plus what the client
/// asks of its host when starting.
pub trait TunnelHost: TunnelEvents {
    /// Application name reported to the tunnel client.
    fn app_name(&self) -> &str;

    /// Serialized configuration payload, opaque to the host.
    fn tunnel_config(&self) -> String;
}

/// Errors reported by a tunnel client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TunnelError {
    #[error("Tunnel failed to start: {0}")]
    StartFailed(String),

    #[error("Tunnel failed to restart: {0}")]
    RestartFailed(String),

    #[error("Tunnel not started")]
    NotStarted,

    #[error("Tunnel already running")]
    AlreadyRunning,
}
