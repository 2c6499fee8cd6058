//! TunneledWebView tunnel layer
//!
//! Owns the external tunnel client for the lifetime of the process and fans
//! its lifecycle callbacks out to at most one observer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Host Process                          │
//! │                                                           │
//! │  ┌──────────────┐  callbacks  ┌─────────────┐  forward    │
//! │  │ TunnelClient │────────────▶│ TunnelOwner │──────────┐  │
//! │  │  (external)  │◀────────────│  (process)  │          │  │
//! │  └──────┬───────┘ start/stop/ └─────────────┘          ▼  │
//! │         │         restart            ┌──────────────────┐ │
//! │         │                            │ ObserverSlot     │ │
//! │         │                            │ (0 or 1 weak ref)│ │
//! │         │                            └──────────────────┘ │
//! └─────────│─────────────────────────────────────────────────┘
//!           ▼ local SOCKS / HTTP proxy
//! ```
//!
//! The tunnel protocol itself is opaque. [`TunnelClient`] is the capability
//! the host drives and [`TunnelHost`] is what the client calls back into.

mod client;
mod config;
mod event;
mod owner;
mod simulated;
mod slot;

pub use client::{TunnelClient, TunnelError, TunnelEvents, TunnelHost};
pub use config::{ConfigError, ConfigResource, HostConfig, DEFAULT_APP_NAME, DEFAULT_HOME_URL};
pub use event::TunnelEvent;
pub use owner::TunnelOwner;
pub use simulated::{SimulatedConfig, SimulatedTunnel};
pub use slot::ObserverSlot;
