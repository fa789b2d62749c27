//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use amzwp_core::{
    AppStore, ConnectionOptions, SecureStorage, StateChange, decrypt_secrets, is_secret_field,
    mask_secret, test_connection,
};
use amzwp_discovery::{ScanOptions, scan_sitemap};
use amzwp_shared::{
    AppConfig, ConfigPatch, STORE_KEY, Settings, init_settings, load_settings, settings_file_path,
};
use amzwp_storage::{FileStore, KvStore};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// AmzWP: configure the publishing assistant and manage its sitemap cache.
#[derive(Parser)]
#[command(
    name = "amzwp",
    version,
    about = "Configure the WordPress affiliate publishing assistant and scan site sitemaps.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the data directory holding the state file.
    #[arg(long, global = true, env = "AMZWP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Publishing configuration (WordPress, Amazon, AI provider).
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Tool settings file (~/.amzwp/amzwp.toml).
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Scan a site's sitemap and store the posts found.
    Scan {
        /// Site URL or direct sitemap URL. Defaults to the configured WordPress URL.
        url: Option<String>,
    },

    /// List the posts from the last scan.
    Posts {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mark the landing page as passed.
    Enter,

    /// Delete all stored state (configuration, sitemap, entry flag).
    Reset {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show a summary of the stored state.
    Status,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the stored configuration with secrets masked.
    Show,
    /// Set one field, e.g. `config set wpUrl https://blog.example.com`.
    Set {
        /// camelCase field name.
        key: String,
        /// New value. An empty string clears optional fields.
        value: String,
    },
    /// Test the WordPress connection with the stored credentials.
    Test,
    /// Print the path of the state file.
    Path,
}

/// Settings subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Write a settings file with defaults.
    Init,
    /// Show resolved settings.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "amzwp=info",
        1 => "amzwp=debug",
        _ => "amzwp=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings()?;
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => settings.data_dir()?,
    };
    let ctx = Context { settings, data_dir };

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(&ctx),
            ConfigAction::Set { key, value } => cmd_config_set(&ctx, &key, &value),
            ConfigAction::Test => cmd_config_test(&ctx).await,
            ConfigAction::Path => cmd_config_path(&ctx),
        },
        Command::Settings { action } => match action {
            SettingsAction::Init => cmd_settings_init(),
            SettingsAction::Show => cmd_settings_show(&ctx),
        },
        Command::Scan { url } => cmd_scan(&ctx, url.as_deref()).await,
        Command::Posts { json } => cmd_posts(&ctx, json),
        Command::Enter => cmd_enter(&ctx),
        Command::Reset { yes } => cmd_reset(&ctx, yes),
        Command::Status => cmd_status(&ctx),
    }
}

/// Resolved settings shared by every command.
struct Context {
    settings: Settings,
    data_dir: PathBuf,
}

impl Context {
    fn open_store(&self) -> AppStore<FileStore> {
        AppStore::load(FileStore::new(&self.data_dir))
    }
}

/// Turn store change events into an error when the state file could not be
/// written, so scripted callers see a non-zero exit.
fn check_persisted(changes: &[StateChange]) -> Result<()> {
    for change in changes {
        if let StateChange::PersistFailed(message) = change {
            return Err(eyre!("failed to write state: {message}"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_show(ctx: &Context) -> Result<()> {
    let store = ctx.open_store();
    let masked = masked_config(store.config());
    println!("{}", serde_json::to_string_pretty(&masked)?);
    Ok(())
}

/// Plain-text view of `config` with every credential masked.
fn masked_config(config: &AppConfig) -> AppConfig {
    let plain = decrypt_secrets(config);
    let mask_opt = |v: &Option<String>| v.as_deref().map(mask_secret);
    AppConfig {
        wp_app_password: mask_secret(&plain.wp_app_password),
        amazon_access_key: mask_secret(&plain.amazon_access_key),
        amazon_secret_key: mask_secret(&plain.amazon_secret_key),
        serp_api_key: mask_opt(&plain.serp_api_key),
        gemini_api_key: mask_opt(&plain.gemini_api_key),
        openai_api_key: mask_opt(&plain.openai_api_key),
        anthropic_api_key: mask_opt(&plain.anthropic_api_key),
        groq_api_key: mask_opt(&plain.groq_api_key),
        openrouter_api_key: mask_opt(&plain.openrouter_api_key),
        ..plain
    }
}

fn cmd_config_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let stored_value = if is_secret_field(key) {
        SecureStorage::encrypt(value)
    } else {
        value.to_string()
    };
    let mut patch = ConfigPatch::from_field(key, &stored_value)?;

    let mut store = ctx.open_store();
    if let Some(provider) = patch.ai_provider {
        if provider != store.config().ai_provider && patch.ai_model.is_none() {
            patch.ai_model = Some(provider.default_model().to_string());
        }
    }

    let changes = store.update_config(patch);
    check_persisted(&changes)?;

    if changes.is_empty() {
        println!("{key} unchanged");
    } else {
        info!(key, "configuration updated");
        println!("{key} updated");
    }
    Ok(())
}

async fn cmd_config_test(ctx: &Context) -> Result<()> {
    let store = ctx.open_store();
    let config = decrypt_secrets(store.config());
    let opts = ConnectionOptions::from(&ctx.settings.network);

    let spinner = spinner(format!("Testing connection to {}", config.wp_url));
    let status = test_connection(&config, &opts).await;
    spinner.finish_and_clear();

    if status.success {
        println!("Connected to WordPress!");
        if let Some(message) = status.message {
            println!("  {message}");
        }
        Ok(())
    } else {
        Err(eyre!(
            "{}",
            status.message.unwrap_or_else(|| "Connection failed".into())
        ))
    }
}

fn cmd_config_path(ctx: &Context) -> Result<()> {
    let store = FileStore::new(&ctx.data_dir);
    println!("{}", store.path_for(STORE_KEY)?.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn cmd_settings_init() -> Result<()> {
    let path = init_settings()?;
    println!("Settings initialized at: {}", path.display());
    Ok(())
}

fn cmd_settings_show(ctx: &Context) -> Result<()> {
    println!("# {}", settings_file_path()?.display());
    println!("{}", toml::to_string_pretty(&ctx.settings)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Sitemap
// ---------------------------------------------------------------------------

async fn cmd_scan(ctx: &Context, url: Option<&str>) -> Result<()> {
    let mut store = ctx.open_store();
    let target = match url {
        Some(u) => u.to_string(),
        None if !store.config().wp_url.is_empty() => store.config().wp_url.clone(),
        None => return Err(eyre!("no URL given and no WordPress URL configured")),
    };

    let opts = ScanOptions::from(&ctx.settings.network);
    let spinner = spinner(format!("Scanning sitemap of {target}"));
    let result = scan_sitemap(&target, &opts).await;
    spinner.finish_and_clear();
    let sitemap = result?;

    let count = sitemap.posts.len();
    let changes = store.set_sitemap(sitemap);
    check_persisted(&changes)?;

    if count == 0 {
        warn!(url = %target, "sitemap contained no posts");
    }
    println!("Found {count} posts on {target}");
    Ok(())
}

fn cmd_posts(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.open_store();
    let sitemap = store.sitemap();

    if json {
        println!("{}", serde_json::to_string_pretty(&sitemap.posts)?);
        return Ok(());
    }

    if sitemap.posts.is_empty() {
        println!("No posts stored. Run `amzwp scan <url>` first.");
        return Ok(());
    }

    for post in &sitemap.posts {
        let lastmod = post.lastmod.as_deref().unwrap_or("-");
        println!("{:>5}  {:<10}  {}", post.id, truncate(lastmod, 10), post.title);
        println!("       {}", post.url);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

fn cmd_enter(ctx: &Context) -> Result<()> {
    let mut store = ctx.open_store();
    let changes = store.enter();
    check_persisted(&changes)?;
    if changes.is_empty() {
        println!("Already entered.");
    } else {
        println!("Entered. Run `amzwp-tui` to scan and edit posts.");
    }
    Ok(())
}

fn cmd_reset(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        eprint!("This deletes the stored configuration and sitemap. Continue? [y/N] ");
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut store = ctx.open_store();
    store.reset()?;
    println!("State reset.");
    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let store = ctx.open_store();
    let config = store.config();
    let sitemap = store.sitemap();
    let path = FileStore::new(&ctx.data_dir).path_for(STORE_KEY)?;
    let stored = FileStore::new(&ctx.data_dir).get(STORE_KEY)?.is_some();

    let ai = config.ai_settings();
    let model = ai.model().filter(|m| !m.is_empty()).unwrap_or("(none)");

    println!();
    println!("  State file: {}{}", path.display(), if stored { "" } else { " (not created)" });
    println!("  Entered:    {}", if store.has_entered() { "yes" } else { "no" });
    println!(
        "  WordPress:  {}",
        if config.wp_url.is_empty() { "(not set)" } else { config.wp_url.as_str() }
    );
    println!(
        "  AI:         {} / {model}{}",
        ai.provider().label(),
        if ai.api_key().is_some_and(|k| !k.is_empty()) { "" } else { " (no API key)" }
    );
    println!(
        "  Sitemap:    {} posts{}",
        sitemap.posts.len(),
        if sitemap.url.is_empty() { String::new() } else { format!(" from {}", sitemap.url) }
    );
    if let Some(at) = sitemap.scanned_at {
        println!("  Scanned:    {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// A steady-ticking spinner on stderr.
fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
