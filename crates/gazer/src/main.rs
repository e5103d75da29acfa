mod app;
mod file_list;
mod host;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gazer_core::config::GazerConfig;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

use crate::app::GazerApp;
use crate::file_list::FileList;
use crate::host::HostEvent;

#[derive(Parser)]
#[command(name = "gazer", about = "HDR, raw and bitmap image viewer")]
#[command(version)]
struct Cli {
    /// Images to open. A single file opens its whole directory.
    paths: Vec<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/gazer/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("gazer").join("config.toml"))
}

fn load_config(explicit: Option<&PathBuf>) -> Result<GazerConfig> {
    if let Some(path) = explicit {
        return GazerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.is_file() => GazerConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        _ => Ok(GazerConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", GazerConfig::default().to_toml()?);
        return Ok(());
    }

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_ref())?;
    let files = FileList::from_args(&cli.paths)?;

    let event_loop = EventLoop::<HostEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;
    let mut app = GazerApp::new(config, files, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;
    Ok(())
}
