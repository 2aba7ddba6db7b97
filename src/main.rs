use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repowarden::config::LoggingConfig;
use repowarden::github::auth_setup;
use repowarden::{
    Config, DesiredConfiguration, FilterSpec, FsLocalFiles, GitHubClient, RepositoryFilter,
    RunMode, SyncEngine, TracingReporter,
};

#[derive(Parser)]
#[command(name = "repowarden")]
#[command(about = "Declarative settings reconciliation for GitHub organizations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Default organization to reconcile
        #[arg(long)]
        org: Option<String>,

        /// Default settings document
        #[arg(long)]
        settings: Option<String>,
    },

    /// Manage authentication
    Auth {
        #[command(subcommand)]
        auth_command: AuthCommands,
    },

    /// Reconcile repository settings against the settings document
    Sync {
        /// Organization to reconcile (defaults to github.organization)
        #[arg(long)]
        org: Option<String>,

        /// Settings document (defaults to settings_file)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Perform all reads and comparisons without making changes
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List repositories that would be reconciled
    List {
        /// Organization to list (defaults to github.organization)
        #[arg(long)]
        org: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Set up authentication
    Setup,

    /// Test current authentication
    Test,

    /// Show authentication status
    Status,
}

/// Repository filters; each one overrides the configured default
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only repositories whose name matches this regex
    #[arg(long)]
    name_pattern: Option<String>,

    /// Only repositories carrying this label
    #[arg(long)]
    label: Option<String>,

    /// Only repositories with this primary language (case-insensitive)
    #[arg(long)]
    language: Option<String>,
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        FilterSpec {
            name_pattern: args.name_pattern,
            label: args.label,
            language: args.language,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; init may target a file that does not exist yet
    let config = match (&cli.command, cli.config.as_deref()) {
        (Commands::Init { .. }, Some(path)) if !path.exists() => Config::default(),
        (_, path) => load_config(path)?,
    };

    init_logging(&config.logging, cli.verbose)?;
    info!("Starting RepoWarden v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Init { org, settings } => cmd_init(org, settings, cli.config, &config),
        Commands::Auth { auth_command } => cmd_auth(auth_command, &config).await,
        Commands::Sync {
            org,
            settings,
            dry_run,
            filters,
        } => cmd_sync(org, settings, dry_run, filters, &config).await,
        Commands::List { org, filters } => cmd_list(org, filters, &config).await,
    }
}

/// Initialize logging: RUST_LOG wins, then --verbose, then the configured level
fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid logging.level: {}", logging.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "full" {
        registry.with(fmt::layer().with_ansi(logging.color)).init();
    } else {
        registry
            .with(fmt::layer().compact().with_ansi(logging.color))
            .init();
    }

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Write a configuration file with the given defaults
fn cmd_init(
    org: Option<String>,
    settings: Option<String>,
    config_path: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Initializing RepoWarden...");

    let mut new_config = config.clone();
    if org.is_some() {
        new_config.github.organization = org;
    }
    if let Some(settings) = settings {
        new_config.settings_file = settings;
    }

    let config_path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    new_config.save(&config_path)?;

    info!("Configuration saved to: {:?}", config_path);

    println!("✅ RepoWarden initialized successfully!");
    println!("   Config: {:?}", config_path);
    println!("   Settings document: {}", new_config.settings_file);
    match &new_config.github.organization {
        Some(org) => println!("   Organization: {}", org),
        None => println!("   Organization: not set (pass --org to sync)"),
    }
    println!("   Next: run 'repowarden auth test', then 'repowarden sync --dry-run'");

    Ok(())
}

/// Handle authentication commands
async fn cmd_auth(auth_command: AuthCommands, config: &Config) -> Result<()> {
    match auth_command {
        AuthCommands::Setup => auth_setup::setup_authentication().await,
        AuthCommands::Test => auth_setup::test_authentication(config).await,
        AuthCommands::Status => {
            auth_setup::show_status(config);
            Ok(())
        }
    }
}

/// Compile the configured filters with command line overrides applied
fn build_filter(filters: FilterArgs, config: &Config) -> Result<RepositoryFilter> {
    let spec = config.filters.clone().merge(filters.into());
    RepositoryFilter::new(&spec)
}

/// Reconcile every in-scope repository of the organization
async fn cmd_sync(
    org: Option<String>,
    settings: Option<PathBuf>,
    dry_run: bool,
    filters: FilterArgs,
    config: &Config,
) -> Result<()> {
    let organization = config.resolve_organization(org)?;
    let settings_path = settings.unwrap_or_else(|| PathBuf::from(&config.settings_file));

    let desired = DesiredConfiguration::load(&settings_path)?;
    if desired.is_empty() {
        warn!(
            "Settings document {:?} configures no domains; nothing will change",
            settings_path
        );
    }

    let filter = build_filter(filters, config)?;
    let mode = RunMode::from_dry_run(dry_run);

    let client = GitHubClient::new(config).await?;
    let engine = SyncEngine::new(
        Arc::new(client),
        Arc::new(FsLocalFiles),
        Arc::new(TracingReporter),
        filter,
        mode,
    );

    if mode.is_dry_run() {
        println!("🔍 Dry run mode - no changes will be made");
    }

    let summary = engine.run_sync(&organization, &desired).await?;

    println!("\n🎉 Reconciliation Complete!");
    println!("   🏢 Organization: {}", organization);
    println!("   📊 Total repositories: {}", summary.total_repositories);
    println!("   ✅ Processed: {}", summary.processed);
    println!("   ⏭️  Skipped: {}", summary.skipped);
    println!("   ❌ Failures: {}", summary.failures);
    println!("   🔧 Mode: {}", summary.mode);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    Ok(())
}

/// List repositories that would be reconciled
async fn cmd_list(org: Option<String>, filters: FilterArgs, config: &Config) -> Result<()> {
    let organization = config.resolve_organization(org)?;
    let filter = build_filter(filters, config)?;

    info!("Listing repositories...");

    let client = GitHubClient::new(config).await?;
    let engine = SyncEngine::new(
        Arc::new(client),
        Arc::new(FsLocalFiles),
        Arc::new(TracingReporter),
        filter,
        RunMode::DryRun,
    );

    let repositories = engine.in_scope_repositories(&organization).await?;

    println!("Repositories ({}): ", repositories.len());

    for repo in repositories {
        let language = repo.language.as_deref().unwrap_or("-");
        let archived = if repo.archived { " (archived)" } else { "" };
        println!("  📁 {} [{}]{}", repo.full_name(), language, archived);
    }

    Ok(())
}
