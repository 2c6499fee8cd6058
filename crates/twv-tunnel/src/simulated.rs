//! Simulated tunnel client
//!
//! Stands in for the external tunnel library. It runs each tunnel session
//! as a task on a Tokio runtime, which plays the part of the library's own
//! background execution context, and reports a canned lifecycle through the
//! host callbacks:
//!
//! ```text
//! diagnostic → connecting → regions → SOCKS port → HTTP port
//!            → client region → connected → bytes transferred (periodic)
//! ```
//!
//! Each session carries a generation number. `stop` and `restart` bump it,
//! so a superseded session stops emitting even before its task is aborted.

use crate::client::{TunnelClient, TunnelError, TunnelHost};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Behaviour of the simulated tunnel
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// SOCKS port of the first session
    pub socks_port: u16,
    /// HTTP port of the first session
    pub http_port: u16,
    /// Egress regions reported
    pub regions: Vec<String>,
    /// Client region reported
    pub client_region: String,
    /// Delay between lifecycle steps
    pub step_delay: Duration,
    /// Interval of bytes-transferred reports
    pub bytes_interval: Duration,
    /// Refuse to start
    pub fail_start: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            socks_port: 1080,
            http_port: 8080,
            regions: ["US", "CA", "DE", "JP", "GB"].map(String::from).to_vec(),
            client_region: "CA".to_string(),
            step_delay: Duration::from_millis(250),
            bytes_interval: Duration::from_secs(5),
            fail_start: false,
        }
    }
}

/// Tunnel client double driven by a Tokio runtime
pub struct SimulatedTunnel {
    /// Runtime that executes sessions
    handle: Handle,
    /// Host to report to
    host: Weak<dyn TunnelHost>,
    /// Configuration
    config: SimulatedConfig,
    /// Current session generation
    generation: Arc<AtomicU64>,
    /// Is a session running?
    running: AtomicBool,
    /// Number of sessions started
    sessions: AtomicU64,
    /// Running session task
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedTunnel {
    /// Create a new simulated tunnel reporting to `host`
    pub fn new(handle: Handle, host: Weak<dyn TunnelHost>, config: SimulatedConfig) -> Self {
        Self {
            handle,
            host,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            running: AtomicBool::new(false),
            sessions: AtomicU64::new(0),
            task: Mutex::new(None),
        }
    }

    /// Check if a session is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of sessions started so far
    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::SeqCst)
    }

    fn spawn_session(&self, config_override: &str) {
        let index = self.sessions.fetch_add(1, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let session = Session {
            host: self.host.clone(),
            config: self.config.clone(),
            current: self.generation.clone(),
            generation,
            offset: index as u16,
            config_override: config_override.to_string(),
        };

        let task = self.handle.spawn(session.run());
        let previous = self.task.lock().unwrap_or_else(|e| e.into_inner()).replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn end_session(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }
}

impl TunnelClient for SimulatedTunnel {
    fn start(&self, config_override: &str) -> Result<(), TunnelError> {
        if self.config.fail_start {
            return Err(TunnelError::StartFailed("simulated start failure".into()));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(TunnelError::AlreadyRunning);
        }

        info!("Simulated tunnel starting");
        self.spawn_session(config_override);
        Ok(())
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Simulated tunnel stopping");
        }
        self.end_session();
    }

    fn restart(&self) -> Result<(), TunnelError> {
        if !self.is_running() {
            return Err(TunnelError::NotStarted);
        }

        info!("Simulated tunnel restarting");
        self.end_session();
        self.spawn_session("");
        Ok(())
    }
}

impl Drop for SimulatedTunnel {
    fn drop(&mut self) {
        self.end_session();
    }
}

/// One tunnel session
struct Session {
    host: Weak<dyn TunnelHost>,
    config: SimulatedConfig,
    current: Arc<AtomicU64>,
    generation: u64,
    offset: u16,
    config_override: String,
}

impl Session {
    /// Host to report to, while this session is current
    fn host(&self) -> Option<Arc<dyn TunnelHost>> {
        if self.current.load(Ordering::SeqCst) != self.generation {
            return None;
        }
        self.host.upgrade()
    }

    async fn run(self) {
        let Some(host) = self.host() else { return };

        let config = if self.config_override.is_empty() {
            host.tunnel_config()
        } else {
            self.config_override.clone()
        };
        if config.is_empty() {
            host.on_diagnostic_message("no tunnel config supplied, using built-in defaults");
        }
        host.on_diagnostic_message(&format!(
            "{}: tunnel session {} starting",
            host.app_name(),
            self.generation
        ));
        host.on_connecting();
        drop(host);

        tokio::time::sleep(self.config.step_delay).await;

        let Some(host) = self.host() else { return };
        host.on_available_egress_regions(&self.config.regions);
        host.on_listening_socks_proxy_port(self.config.socks_port.wrapping_add(self.offset));
        host.on_listening_http_proxy_port(self.config.http_port.wrapping_add(self.offset));
        host.on_client_region(&self.config.client_region);
        drop(host);

        tokio::time::sleep(self.config.step_delay).await;

        let Some(host) = self.host() else { return };
        host.on_connected();
        drop(host);

        let (mut sent, mut received) = (0u64, 0u64);
        let mut interval = tokio::time::interval(self.config.bytes_interval);
        interval.tick().await;

        loop {
            interval.tick().await;

            let Some(host) = self.host() else { break };
            sent += 1_500;
            received += 9_000;
            host.on_bytes_transferred(sent, received);
        }

        debug!("Tunnel session {} ended", self.generation);
    }
}
