//! Browser capability
//!
//! The embedded browser belongs to the UI context. Its proxy setting is a
//! process-wide side channel, so both calls here must only ever be made
//! from the UI thread.

use std::fmt;
use std::marker::PhantomData;
use tracing::info;

/// Local proxy endpoint the browser routes through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Proxy URL form, e.g. `http://127.0.0.1:8080`
    pub fn url(&self) -> String {
        format!("http://{}", self)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Browser settings applied when a screen is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserSettings {
    pub javascript_enabled: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
        }
    }
}

/// Embedded browser, driven from the UI context only.
pub trait Browser {
    /// Route all browser traffic through `proxy`.
    fn set_proxy(&mut self, proxy: &ProxyEndpoint);

    /// Navigate to `url`.
    fn load_url(&mut self, url: &str);

    /// Mutable access to settings
    fn settings_mut(&mut self) -> &mut BrowserSettings;
}

/// One operation applied to a [`HeadlessBrowser`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    SetProxy(ProxyEndpoint),
    Load { url: String, proxy: Option<ProxyEndpoint> },
}

/// Browser without a view: records what it is asked to do.
#[derive(Debug, Default)]
pub struct HeadlessBrowser {
    settings: BrowserSettings,
    proxy: Option<ProxyEndpoint>,
    actions: Vec<BrowserAction>,
    /// Pins the browser to the thread that created it
    _ui_thread: PhantomData<*const ()>,
}

impl HeadlessBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proxy currently applied
    pub fn proxy(&self) -> Option<&ProxyEndpoint> {
        self.proxy.as_ref()
    }

    /// Current settings
    pub fn settings(&self) -> BrowserSettings {
        self.settings
    }

    /// Every action, in order
    pub fn actions(&self) -> &[BrowserAction] {
        &self.actions
    }

    /// URL of the last navigation
    pub fn current_url(&self) -> Option<&str> {
        self.actions.iter().rev().find_map(|action| match action {
            BrowserAction::Load { url, .. } => Some(url.as_str()),
            BrowserAction::SetProxy(_) => None,
        })
    }
}

impl Browser for HeadlessBrowser {
    fn set_proxy(&mut self, proxy: &ProxyEndpoint) {
        info!("Browser proxy set to {}", proxy.url());
        self.proxy = Some(proxy.clone());
        self.actions.push(BrowserAction::SetProxy(proxy.clone()));
    }

    fn load_url(&mut self, url: &str) {
        match &self.proxy {
            Some(proxy) => info!("Loading {} via {}", url, proxy),
            None => info!("Loading {} without proxy", url),
        }
        self.actions.push(BrowserAction::Load {
            url: url.to_string(),
            proxy: self.proxy.clone(),
        });
    }

    fn settings_mut(&mut self) -> &mut BrowserSettings {
        &mut self.settings
    }
}
