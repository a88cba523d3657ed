mod config;
mod entity;
mod plugin_manager;
mod server;
mod state;
mod world;

use std::path::Path;
use std::time::Duration;

use config::ServerConfig;
use plugin_manager::PluginManager;
use server::Server;
use state::ServerState;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use trampoline_core::TrampolinePlugin;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "Trampoline simulation server v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let state = match ServerState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid server.toml: {e}");
            std::process::exit(1);
        }
    };
    for name in state.world_names() {
        info!("World: {name}");
    }
    info!("{} entities loaded", state.entities().len());

    let mut plugin = TrampolinePlugin::new();
    if let Some(path) = &config.plugin.config {
        info!("Trampoline configuration: {path}");
        plugin = plugin.with_config_path(path);
    }
    let mut plugins = PluginManager::new();
    plugins.register(Box::new(plugin));
    plugins.load_configs(Path::new("plugins"));

    let mut server = Server::new(state, plugins);
    server.start();

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                server.game_tick();
            }
            Some(line) = console_rx.recv() => {
                if line == "stop" {
                    info!("Stopping");
                    break;
                }
                let response = server.handle_console_command(&line);
                if !response.is_empty() {
                    info!("{response}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    server.shutdown();
    info!("Server shut down.");
}
