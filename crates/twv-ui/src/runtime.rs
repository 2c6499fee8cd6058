//! UI runtime - the loop that owns the UI context.

use crate::browser::Browser;
use crate::message::{UiCommand, UiMessage};
use crate::screen::{Screen, ScreenOptions};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use twv_tunnel::TunnelOwner;

enum Next {
    Message(UiMessage),
    Command(UiCommand),
    Idle,
}

/// Owns the screen and the browser and drives them from one thread.
pub struct UiRuntime<B: Browser> {
    screen: Screen,
    browser: B,
    /// User actions (restart button, quit)
    commands_rx: Receiver<UiCommand>,
    commands_tx: Sender<UiCommand>,
}

impl<B: Browser> UiRuntime<B> {
    /// Create the runtime and its first screen.
    pub fn new(owner: Arc<TunnelOwner>, options: ScreenOptions, mut browser: B) -> Self {
        info!("Initializing UI runtime");

        let screen = Screen::create(owner, options, &mut browser);
        let (commands_tx, commands_rx) = unbounded();

        Self {
            screen,
            browser,
            commands_rx,
            commands_tx,
        }
    }

    /// Sender for user actions; may be used from any thread.
    pub fn commands(&self) -> Sender<UiCommand> {
        self.commands_tx.clone()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Run until [`UiCommand::Quit`] arrives.
    ///
    /// Messages still queued when quitting are applied before returning.
    pub fn run(&mut self) {
        while self.step(None) {}
        self.screen.pump(&mut self.browser);
        info!("UI runtime stopped");
    }

    /// Handle at most one message or command, waiting up to `timeout`
    /// (forever if `None`). Returns false once a quit was requested.
    pub fn step(&mut self, timeout: Option<Duration>) -> bool {
        let next = match timeout {
            Some(timeout) => select! {
                recv(self.screen.receiver()) -> msg => msg.map_or(Next::Idle, Next::Message),
                recv(self.commands_rx) -> cmd => Next::Command(cmd.unwrap_or(UiCommand::Quit)),
                default(timeout) => Next::Idle,
            },
            None => select! {
                recv(self.screen.receiver()) -> msg => msg.map_or(Next::Idle, Next::Message),
                recv(self.commands_rx) -> cmd => Next::Command(cmd.unwrap_or(UiCommand::Quit)),
            },
        };

        match next {
            Next::Message(message) => self.screen.handle(message, &mut self.browser),
            Next::Command(UiCommand::Restart) => self.screen.restart(&mut self.browser),
            Next::Command(UiCommand::Quit) => return false,
            Next::Idle => {}
        }
        true
    }
}
