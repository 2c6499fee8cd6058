//! Session state machine
//!
//! Decides when the browser may be pointed at the tunnel's HTTP proxy.
//!
//! ```text
//!            http port              connected
//!   Idle ───────────────▶ PortKnown ───────────▶ Browsing
//!    │                        ▲                    │  ▲
//!    │ connected              │     http port      │  │ connected
//!    ▼                        └────────────────────┘  │ (reconnect)
//!   AwaitingPort ─────────── http port ───────────────┘
//! ```
//!
//! Under [`PortPolicy::LegacyDefault`], `connected` from `Idle` browses
//! immediately through port 0 instead of waiting in `AwaitingPort`.

use std::fmt;
use tracing::{debug, warn};
use twv_tunnel::TunnelEvent;

/// What the UI knows about the tunnel session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing known yet
    #[default]
    Idle,
    /// HTTP proxy port known, tunnel not yet connected
    PortKnown { port: u16 },
    /// Tunnel connected before any HTTP proxy port arrived
    AwaitingPort,
    /// Browser routed through the proxy
    Browsing { port: u16 },
}

impl SessionState {
    /// Port the browser is, or will be, routed through
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::PortKnown { port } | Self::Browsing { port } => Some(*port),
            Self::Idle | Self::AwaitingPort => None,
        }
    }

    /// Check if the browser is routed through the tunnel
    pub fn is_browsing(&self) -> bool {
        matches!(self, Self::Browsing { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PortKnown { port } => write!(f, "port-known({})", port),
            Self::AwaitingPort => write!(f, "awaiting-port"),
            Self::Browsing { port } => write!(f, "browsing({})", port),
        }
    }
}

/// How `connected` before any proxy port is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortPolicy {
    /// Hold navigation until the HTTP proxy port is known
    #[default]
    RequirePort,
    /// Browse through port 0, the unset default
    LegacyDefault,
}

/// Side effect a transition asks of the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do
    Stay,
    /// Point the browser's proxy at `port`, then load the home page
    Navigate { port: u16 },
}

/// Session state plus the policy driving it
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
    policy: PortPolicy,
}

impl SessionMachine {
    /// Create a machine in `Idle`
    pub fn new(policy: PortPolicy) -> Self {
        Self {
            state: SessionState::Idle,
            policy,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Feed one tunnel event.
    pub fn apply(&mut self, event: &TunnelEvent) -> Transition {
        match event {
            TunnelEvent::ListeningHttpProxyPort(port) => self.on_http_proxy_port(*port),
            TunnelEvent::Connected => self.on_connected(),
            _ => Transition::Stay,
        }
    }

    fn on_http_proxy_port(&mut self, port: u16) -> Transition {
        let (next, transition) = match self.state {
            SessionState::Idle | SessionState::PortKnown { .. } => {
                (SessionState::PortKnown { port }, Transition::Stay)
            }
            SessionState::AwaitingPort => {
                (SessionState::Browsing { port }, Transition::Navigate { port })
            }
            SessionState::Browsing { port: old } => {
                debug!("HTTP proxy port changed {} -> {}, waiting for reconnect", old, port);
                (SessionState::PortKnown { port }, Transition::Stay)
            }
        };
        self.move_to(next);
        transition
    }

    fn on_connected(&mut self) -> Transition {
        let (next, transition) = match (self.state, self.policy) {
            (SessionState::Idle, PortPolicy::RequirePort) => {
                warn!("Connected before any HTTP proxy port, holding navigation");
                (SessionState::AwaitingPort, Transition::Stay)
            }
            (SessionState::Idle, PortPolicy::LegacyDefault) => {
                warn!("Connected before any HTTP proxy port, browsing through port 0");
                (SessionState::Browsing { port: 0 }, Transition::Navigate { port: 0 })
            }
            (SessionState::AwaitingPort, _) => (SessionState::AwaitingPort, Transition::Stay),
            (SessionState::PortKnown { port } | SessionState::Browsing { port }, _) => {
                (SessionState::Browsing { port }, Transition::Navigate { port })
            }
        };
        self.move_to(next);
        transition
    }

    fn move_to(&mut self, next: SessionState) {
        if next != self.state {
            debug!("Session {} -> {}", self.state, next);
        }
        self.state = next;
    }
}
