//! TunneledWebView: browser routed through an anonymizing tunnel
//!
//! Starts the tunnel once for the lifetime of the process, shows its
//! lifecycle as a log and loads the home page through the tunnel's local
//! HTTP proxy once connected.
//!
//! Type `r` + Enter to restart the tunnel, `q` + Enter to quit.

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use twv_tunnel::{HostConfig, SimulatedConfig, SimulatedTunnel, TunnelOwner};
use twv_ui::{HeadlessBrowser, ScreenOptions, UiCommand, UiRuntime};

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Host config location, overridable with `TWV_CONFIG`
fn config_path() -> PathBuf {
    std::env::var_os("TWV_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tunneled-webview.toml"))
}

/// Forward stdin lines as user actions until quit or EOF.
fn spawn_input_reader(commands: Sender<UiCommand>) -> Result<()> {
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let command = match line.as_deref().map(str::trim) {
                    Ok("r") | Ok("restart") => UiCommand::Restart,
                    Ok("q") | Ok("quit") | Err(_) => UiCommand::Quit,
                    Ok(other) => {
                        warn!("Unknown command: {:?} (r = restart, q = quit)", other);
                        continue;
                    }
                };
                let quit = command == UiCommand::Quit;
                if commands.send(command).is_err() || quit {
                    return;
                }
            }
            let _ = commands.send(UiCommand::Quit);
        })
        .context("Failed to spawn stdin reader")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let path = config_path();
    let config = HostConfig::load(&path)
        .with_context(|| format!("Failed to load host config from {}", path.display()))?;

    info!("{} starting", config.app_name);

    // The tunnel library runs on its own threads
    let tunnel_runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tunnel")
        .enable_all()
        .build()
        .context("Failed to build tunnel runtime")?;

    let handle = tunnel_runtime.handle().clone();
    let owner = TunnelOwner::new(&config, |host| {
        Box::new(SimulatedTunnel::new(handle, host, SimulatedConfig::default()))
    });

    let mut ui = UiRuntime::new(owner.clone(), ScreenOptions::from(&config), HeadlessBrowser::new());
    owner.start();

    spawn_input_reader(ui.commands())?;
    ui.run();

    info!("Final state: {}", ui.screen().status());
    owner.stop();
    drop(ui);
    tunnel_runtime.shutdown_timeout(std::time::Duration::from_secs(1));

    info!("{} shutting down", config.app_name);
    Ok(())
}
