//! Tunnel Owner
//!
//! Process-scope owner of the tunnel client. Created once at process start,
//! it starts the tunnel, restarts it on demand, stops it on teardown and
//! forwards every lifecycle callback to the currently registered observer.
//!
//! # Usage
//!
//! ```rust,ignore
//! let owner = TunnelOwner::new(&HostConfig::default(), |host| {
//!     Box::new(SimulatedTunnel::new(runtime.handle().clone(), host, SimulatedConfig::default()))
//! });
//! owner.start();
//!
//! let observer: Arc<dyn TunnelEvents> = Arc::new(MyObserver::default());
//! owner.register_observer(Some(&observer));
//! // ...
//! owner.register_observer(None);
//! owner.stop();
//! ```

use crate::client::{TunnelClient, TunnelEvents, TunnelHost};
use crate::config::{ConfigResource, HostConfig};
use crate::slot::ObserverSlot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

/// Owns the tunnel client and fans out its events.
pub struct TunnelOwner {
    /// App name reported to the client
    app_name: String,
    /// Bundled tunnel configuration
    resource: ConfigResource,
    /// The tunnel client, for the lifetime of the process
    client: Box<dyn TunnelClient>,
    /// Active observer (0 or 1)
    observer: ObserverSlot,
    /// Events delivered to an observer
    forwarded: AtomicU64,
    /// Events that found no observer
    dropped: AtomicU64,
}

impl TunnelOwner {
    /// Create the owner and its tunnel client.
    ///
    /// `make_client` receives a weak handle to the owner as the client's
    /// host, so the client can call back without keeping the owner alive.
    pub fn new<F>(config: &HostConfig, make_client: F) -> Arc<Self>
    where
        F: FnOnce(Weak<dyn TunnelHost>) -> Box<dyn TunnelClient>,
    {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let host: Weak<dyn TunnelHost> = weak.clone();
            Self {
                app_name: config.app_name.clone(),
                resource: config.tunnel_resource(),
                client: make_client(host),
                observer: ObserverSlot::new(),
                forwarded: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }
        })
    }

    /// Start the tunnel. Returns immediately; failure is logged only.
    pub fn start(&self) {
        info!("Starting tunnel");
        if let Err(e) = self.client.start("") {
            error!("Tunnel failed to start: {}", e);
        }
    }

    /// Stop the tunnel. Safe even if it never connected.
    pub fn stop(&self) {
        info!("Stopping tunnel");
        self.client.stop();
    }

    /// Restart the tunnel. Failure is logged only.
    pub fn restart(&self) {
        info!("Restarting tunnel");
        if let Err(e) = self.client.restart() {
            error!("Tunnel failed to restart: {}", e);
        }
    }

    /// Replace the active observer; `None` clears it.
    ///
    /// The displaced observer is not notified.
    pub fn register_observer(&self, observer: Option<&Arc<dyn TunnelEvents>>) {
        let displaced = self.observer.replace(observer);
        debug!(
            "Observer {} (displaced: {})",
            if observer.is_some() { "registered" } else { "cleared" },
            displaced
        );
    }

    /// Clear the active observer if it is still `observer`.
    ///
    /// A screen tearing down after its replacement registered leaves the
    /// replacement in place.
    pub fn unregister_observer(&self, observer: &Arc<dyn TunnelEvents>) {
        if self.observer.clear_if(observer) {
            debug!("Observer unregistered");
        }
    }

    /// Check whether an observer is registered
    pub fn has_observer(&self) -> bool {
        self.observer.is_occupied()
    }

    /// Serialized tunnel configuration, or an empty string on failure.
    pub fn provide_configuration(&self) -> String {
        match self.resource.read() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to get tunnel config: {}", e);
                String::new()
            }
        }
    }

    /// Number of events delivered to an observer
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Number of events dropped for lack of an observer
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn forward(&self, kind: &str, deliver: impl FnOnce(&dyn TunnelEvents)) {
        match self.observer.current() {
            Some(observer) => {
                deliver(observer.as_ref());
                self.forwarded.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                debug!("No observer registered, dropping {} event", kind);
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl TunnelEvents for TunnelOwner {
    fn on_diagnostic_message(&self, message: &str) {
        self.forward("diagnostic-message", |o| o.on_diagnostic_message(message));
    }

    fn on_available_egress_regions(&self, regions: &[String]) {
        self.forward("available-egress-regions", |o| o.on_available_egress_regions(regions));
    }

    fn on_listening_socks_proxy_port(&self, port: u16) {
        self.forward("listening-socks-proxy-port", |o| o.on_listening_socks_proxy_port(port));
    }

    fn on_listening_http_proxy_port(&self, port: u16) {
        self.forward("listening-http-proxy-port", |o| o.on_listening_http_proxy_port(port));
    }

    fn on_connecting(&self) {
        self.forward("connecting", |o| o.on_connecting());
    }

    fn on_connected(&self) {
        self.forward("connected", |o| o.on_connected());
    }

    fn on_bytes_transferred(&self, sent: u64, received: u64) {
        self.forward("bytes-transferred", |o| o.on_bytes_transferred(sent, received));
    }

    fn on_client_region(&self, region: &str) {
        self.forward("client-region", |o| o.on_client_region(region));
    }
}

impl TunnelHost for TunnelOwner {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn tunnel_config(&self) -> String {
        self.provide_configuration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TunnelError;
    use crate::event::TunnelEvent;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Client double counting calls, optionally failing.
    #[derive(Default)]
    struct CountingClient {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        restarts: Arc<AtomicUsize>,
        fail: bool,
    }

    impl TunnelClient for CountingClient {
        fn start(&self, _config_override: &str) -> Result<(), TunnelError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TunnelError::StartFailed("no network".into()));
            }
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn restart(&self) -> Result<(), TunnelError> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TunnelError::RestartFailed("no network".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TunnelEvent>>);

    impl Recorder {
        fn events(&self) -> Vec<TunnelEvent> {
            self.0.lock().unwrap().clone()
        }

        fn push(&self, event: TunnelEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl TunnelEvents for Recorder {
        fn on_diagnostic_message(&self, message: &str) {
            self.push(TunnelEvent::DiagnosticMessage(message.into()));
        }
        fn on_available_egress_regions(&self, regions: &[String]) {
            self.push(TunnelEvent::AvailableEgressRegions(regions.to_vec()));
        }
        fn on_listening_socks_proxy_port(&self, port: u16) {
            self.push(TunnelEvent::ListeningSocksProxyPort(port));
        }
        fn on_listening_http_proxy_port(&self, port: u16) {
            self.push(TunnelEvent::ListeningHttpProxyPort(port));
        }
        fn on_connecting(&self) {
            self.push(TunnelEvent::Connecting);
        }
        fn on_connected(&self) {
            self.push(TunnelEvent::Connected);
        }
        fn on_bytes_transferred(&self, sent: u64, received: u64) {
            self.push(TunnelEvent::BytesTransferred { sent, received });
        }
        fn on_client_region(&self, region: &str) {
            self.push(TunnelEvent::ClientRegion(region.into()));
        }
    }

    fn owner_with(client: CountingClient) -> Arc<TunnelOwner> {
        TunnelOwner::new(&HostConfig::default(), move |_| Box::new(client))
    }

    fn all_events() -> Vec<TunnelEvent> {
        vec![
            TunnelEvent::DiagnosticMessage("diag".into()),
            TunnelEvent::AvailableEgressRegions(vec!["US".into(), "CA".into(), "DE".into()]),
            TunnelEvent::ListeningSocksProxyPort(1080),
            TunnelEvent::ListeningHttpProxyPort(8080),
            TunnelEvent::Connecting,
            TunnelEvent::Connected,
            TunnelEvent::BytesTransferred { sent: 1, received: u64::MAX },
            TunnelEvent::ClientRegion("CA".into()),
        ]
    }

    #[test]
    fn test_forwarding_is_pass_through() {
        let owner = owner_with(CountingClient::default());
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn TunnelEvents> = recorder.clone();
        owner.register_observer(Some(&observer));

        let events = all_events();
        for event in &events {
            event.dispatch(owner.as_ref());
        }

        assert_eq!(recorder.events(), events);
        assert_eq!(owner.forwarded(), events.len() as u64);
        assert_eq!(owner.dropped(), 0);
    }

    #[test]
    fn test_no_observer_drops_without_replay() {
        let owner = owner_with(CountingClient::default());
        owner.on_connecting();
        owner.on_listening_http_proxy_port(8080);
        assert_eq!(owner.dropped(), 2);

        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn TunnelEvents> = recorder.clone();
        owner.register_observer(Some(&observer));
        assert!(recorder.events().is_empty());

        owner.on_connected();
        assert_eq!(recorder.events(), vec![TunnelEvent::Connected]);
    }

    #[test]
    fn test_replacement_stops_delivery_to_previous() {
        let owner = owner_with(CountingClient::default());
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let observer_a: Arc<dyn TunnelEvents> = a.clone();
        let observer_b: Arc<dyn TunnelEvents> = b.clone();

        owner.register_observer(Some(&observer_a));
        owner.on_connecting();
        owner.register_observer(Some(&observer_b));
        owner.on_connected();
        owner.on_client_region("US");

        assert_eq!(a.events(), vec![TunnelEvent::Connecting]);
        assert_eq!(
            b.events(),
            vec![TunnelEvent::Connected, TunnelEvent::ClientRegion("US".into())]
        );
    }

    #[test]
    fn test_cleared_observer_receives_nothing() {
        let owner = owner_with(CountingClient::default());
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn TunnelEvents> = recorder.clone();

        owner.register_observer(Some(&observer));
        owner.register_observer(None);
        owner.on_connected();

        assert!(recorder.events().is_empty());
        assert!(!owner.has_observer());
    }

    #[test]
    fn test_unregister_leaves_replacement() {
        let owner = owner_with(CountingClient::default());
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let observer_a: Arc<dyn TunnelEvents> = a.clone();
        let observer_b: Arc<dyn TunnelEvents> = b.clone();

        owner.register_observer(Some(&observer_a));
        owner.register_observer(Some(&observer_b));
        owner.unregister_observer(&observer_a);
        owner.on_connected();

        assert!(a.events().is_empty());
        assert_eq!(b.events(), vec![TunnelEvent::Connected]);
    }

    #[test]
    fn test_dropped_observer_is_absent() {
        let owner = owner_with(CountingClient::default());
        let observer: Arc<dyn TunnelEvents> = Arc::new(Recorder::default());
        owner.register_observer(Some(&observer));
        drop(observer);

        owner.on_connected();
        assert_eq!(owner.dropped(), 1);
    }

    #[test]
    fn test_restart_delegates_once_per_call() {
        for fail in [false, true] {
            let client = CountingClient { fail, ..Default::default() };
            let restarts = client.restarts.clone();
            let owner = owner_with(client);

            owner.restart();
            owner.restart();

            assert_eq!(restarts.load(Ordering::SeqCst), 2);
        }
    }

    #[test]
    fn test_start_failure_is_swallowed() {
        let client = CountingClient { fail: true, ..Default::default() };
        let starts = client.starts.clone();
        let stops = client.stops.clone();
        let owner = owner_with(client);

        owner.start();
        owner.stop();

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_without_start() {
        let client = CountingClient::default();
        let stops = client.stops.clone();
        let owner = owner_with(client);

        owner.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provide_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tunnel_config.json");
        std::fs::write(&path, r#"{ "SponsorId": "XYZ" }"#).unwrap();

        let config = HostConfig {
            tunnel_config_path: path,
            ..HostConfig::default()
        };
        let owner = TunnelOwner::new(&config, |_| Box::new(CountingClient::default()));

        assert_eq!(owner.provide_configuration(), r#"{"SponsorId":"XYZ"}"#);
        assert_eq!(owner.tunnel_config(), owner.provide_configuration());
        assert_eq!(owner.app_name(), "TunneledWebView");
    }

    #[test]
    fn test_provide_configuration_failure_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = HostConfig {
            tunnel_config_path: dir.path().join("missing.json"),
            ..HostConfig::default()
        };
        let owner = TunnelOwner::new(&config, |_| Box::new(CountingClient::default()));

        assert_eq!(owner.provide_configuration(), "");
    }

    /// Captures formatted log output in memory
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_provide_configuration_failure_logs_error() {
        let dir = TempDir::new().unwrap();
        let config = HostConfig {
            tunnel_config_path: dir.path().join("missing.json"),
            ..HostConfig::default()
        };
        let owner = TunnelOwner::new(&config, |_| Box::new(CountingClient::default()));

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let payload = tracing::subscriber::with_default(subscriber, || owner.provide_configuration());
        assert_eq!(payload, "");

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Failed to get tunnel config"));
    }

    #[test]
    fn test_client_gets_weak_host() {
        let mut captured = None;
        let owner = TunnelOwner::new(&HostConfig::default(), |host| {
            captured = Some(host);
            Box::new(CountingClient::default())
        });

        let host = captured.unwrap();
        assert_eq!(host.upgrade().unwrap().app_name(), "TunneledWebView");

        drop(owner);
        assert!(host.upgrade().is_none());
    }

    #[test]
    fn test_concurrent_forwarding_and_registration() {
        let owner = owner_with(CountingClient::default());
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn TunnelEvents> = recorder.clone();

        let emitters: Vec<_> = (0..4)
            .map(|_| {
                let owner = owner.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        owner.on_bytes_transferred(1, 1);
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            owner.register_observer(Some(&observer));
            owner.register_observer(None);
        }
        owner.register_observer(Some(&observer));

        for emitter in emitters {
            emitter.join().unwrap();
        }

        assert_eq!(owner.forwarded() + owner.dropped(), 400);
        assert_eq!(recorder.events().len() as u64, owner.forwarded());
    }
}
