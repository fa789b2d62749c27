//! AmzWP TUI: interactive terminal front-end for the publishing assistant.
//!
//! Landing page, sitemap scanner, post editor and the settings panel, built
//! with `ratatui` + `crossterm`. Logs go to `<data dir>/amzwp-tui.log` so they
//! never draw over the interface.

mod app;
mod screens;
mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use amzwp_core::AppStore;
use amzwp_shared::load_settings;
use amzwp_storage::FileStore;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

/// Printed when the app fails, so a broken state file can be recovered from.
const RESET_HINT: &str = "If this keeps happening, the saved state may be broken. \
Run `amzwp reset` or start with `amzwp-tui --reset` to start over.";

#[derive(Parser)]
#[command(name = "amzwp-tui", version, about = "Interactive AmzWP terminal interface.")]
struct Args {
    /// Delete stored state before starting.
    #[arg(long)]
    reset: bool,

    /// Override the data directory holding the state file.
    #[arg(long, env = "AMZWP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let settings = load_settings()?;
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => settings.data_dir()?,
    };
    init_tracing(&data_dir)?;
    install_panic_hook();

    let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start async runtime")?;

    let mut store = AppStore::load(FileStore::new(&data_dir));
    if args.reset {
        store.reset()?;
        tracing::info!("state reset on startup");
    }

    let app = app::App::new(store, settings, runtime.handle().clone());
    let result = app::run(app);
    if let Err(e) = &result {
        tracing::error!(error = %e, "tui exited with error");
        eprintln!("{RESET_HINT}");
    }
    result
}

/// Log to a file inside the data directory.
fn init_tracing(data_dir: &Path) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    std::fs::create_dir_all(data_dir)
        .wrap_err_with(|| format!("failed to create {}", data_dir.display()))?;
    let log_path = data_dir.join("amzwp-tui.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .wrap_err_with(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("amzwp=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Restore the terminal before the panic report is printed.
fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = app::restore_terminal();
        eprintln!("{RESET_HINT}");
        hook(info);
    }));
}
