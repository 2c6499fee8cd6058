//! Observer screen
//!
//! One visible screen: registers with the tunnel owner while alive, shows
//! a log of tunnel events and, once the tunnel is connected through a known
//! HTTP proxy port, routes the browser through it and loads the home page.
//!
//! Tunnel callbacks arrive on library threads and are turned into messages
//! by [`EventPoster`]; [`Screen::pump`] applies them on the UI context.

use crate::browser::{Browser, ProxyEndpoint};
use crate::log::LogView;
use crate::message::{EventPoster, UiMessage};
use crate::state::{PortPolicy, SessionMachine, SessionState, Transition};
use crossbeam_channel::{unbounded, Receiver};
use std::sync::Arc;
use tracing::{debug, info};
use twv_tunnel::{HostConfig, TunnelEvent, TunnelEvents, TunnelOwner};

/// Per-screen settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenOptions {
    /// Page loaded once connected
    pub home_url: String,
    /// Host of the local HTTP proxy
    pub proxy_host: String,
    /// Maximum log lines
    pub log_capacity: usize,
    /// Enable JavaScript in the browser
    pub javascript_enabled: bool,
    /// Handling of `connected` before any proxy port
    pub port_policy: PortPolicy,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self::from(&HostConfig::default())
    }
}

impl From<&HostConfig> for ScreenOptions {
    fn from(config: &HostConfig) -> Self {
        Self {
            home_url: config.home_url.clone(),
            proxy_host: config.proxy_host.clone(),
            log_capacity: config.log_capacity,
            javascript_enabled: config.javascript_enabled,
            port_policy: if config.require_proxy_port {
                PortPolicy::RequirePort
            } else {
                PortPolicy::LegacyDefault
            },
        }
    }
}

/// The UI observer of the tunnel
pub struct Screen {
    owner: Arc<TunnelOwner>,
    options: ScreenOptions,
    /// Library-facing half
    poster: Arc<EventPoster>,
    /// Same object as `poster`, as registered with the owner
    registration: Arc<dyn TunnelEvents>,
    /// Single-consumer queue drained on the UI context
    rx: Receiver<UiMessage>,
    log: LogView,
    session: SessionMachine,
}

impl Screen {
    /// Create a screen and register it as the owner's sole observer.
    pub fn create(
        owner: Arc<TunnelOwner>,
        options: ScreenOptions,
        browser: &mut dyn Browser,
    ) -> Self {
        let (tx, rx) = unbounded();
        let poster = Arc::new(EventPoster::new(tx));
        let registration: Arc<dyn TunnelEvents> = poster.clone();

        owner.register_observer(Some(&registration));
        browser.settings_mut().javascript_enabled = options.javascript_enabled;

        debug!("Screen created");
        Self {
            log: LogView::new(options.log_capacity),
            session: SessionMachine::new(options.port_policy),
            owner,
            options,
            poster,
            registration,
            rx,
        }
    }

    /// Queue of pending messages
    pub fn receiver(&self) -> &Receiver<UiMessage> {
        &self.rx
    }

    /// Apply every pending message. Returns how many were handled.
    pub fn pump(&mut self, browser: &mut dyn Browser) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message, browser);
            handled += 1;
        }
        handled
    }

    /// Apply one message on the UI context.
    pub fn handle(&mut self, message: UiMessage, browser: &mut dyn Browser) {
        let UiMessage::Tunnel(event) = message;

        if let TunnelEvent::DiagnosticMessage(text) = &event {
            info!("{}", text);
        }
        self.log.record(&event);

        if let Transition::Navigate { port } = self.session.apply(&event) {
            self.load_through_proxy(port, browser);
        }
    }

    /// Restart the tunnel, then replace this screen with a fresh one.
    pub fn restart(&mut self, browser: &mut dyn Browser) {
        self.owner.restart();
        self.recreate(browser);
    }

    /// Discard all UI state and register a fresh screen.
    ///
    /// Messages still queued for the old screen are dropped with it.
    pub fn recreate(&mut self, browser: &mut dyn Browser) {
        info!("Recreating screen");
        self.owner.unregister_observer(&self.registration);
        *self = Screen::create(self.owner.clone(), self.options.clone(), browser);
    }

    /// Log of this screen
    pub fn log(&self) -> &LogView {
        &self.log
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Last HTTP proxy port published by the tunnel (0 if none)
    pub fn http_proxy_port(&self) -> u16 {
        self.poster.http_proxy_port()
    }

    /// Options this screen was created with
    pub fn options(&self) -> &ScreenOptions {
        &self.options
    }

    /// One-line status for display
    pub fn status(&self) -> String {
        format!(
            "{} | proxy port {} | {} log lines",
            self.state(),
            self.http_proxy_port(),
            self.log.len()
        )
    }

    fn load_through_proxy(&mut self, port: u16, browser: &mut dyn Browser) {
        let proxy = ProxyEndpoint::new(self.options.proxy_host.clone(), port);
        browser.set_proxy(&proxy);
        browser.load_url(&self.options.home_url);
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.owner.unregister_observer(&self.registration);
        debug!("Screen destroyed");
    }
}
