//! TunneledWebView UI runtime
//!
//! Everything that runs on the single UI context:
//! - the observer screen, registered with the tunnel owner while visible
//! - the message queue that carries tunnel events onto the UI context
//! - the explicit session state machine deciding when to browse
//! - the log view and the browser capability

mod browser;
mod log;
mod message;
mod runtime;
mod screen;
mod state;

pub use browser::{Browser, BrowserAction, BrowserSettings, HeadlessBrowser, ProxyEndpoint};
pub use log::LogView;
pub use message::{EventPoster, UiCommand, UiMessage};
pub use runtime::UiRuntime;
pub use screen::{Screen, ScreenOptions};
pub use state::{PortPolicy, SessionMachine, SessionState, Transition};
