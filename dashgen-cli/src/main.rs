//! dashgen CLI - Command-line interface for the examples dashboard generator
//!
//! Collects repository metadata from the hosting API and renders it into a static HTML page

mod report;

use chrono::Utc;
use clap::{Parser, Subcommand};
use dashgen_core::{
    config_error, init_logging, load_category_descriptors, load_repository_descriptors,
    log_operation_error, log_operation_start, log_operation_success, performance::measure_async,
    DashgenConfig, DashgenError, DashgenResult, ErrorContext, LoggingConfig,
};
use dashgen_repo::DashboardPipeline;
use std::path::PathBuf;
use tracing::{error, info};

const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Parser)]
#[command(name = "dashgen")]
#[command(about = "Generate a static dashboard of example repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect repository metadata and render the dashboard
    Generate {
        /// API access token (falls back to the GITHUB_TOKEN environment variable)
        #[arg(short, long)]
        token: Option<String>,

        /// Branch to read examples from when a repository has it
        #[arg(short, long)]
        branch: Option<String>,

        /// Repositories JSON file
        #[arg(long)]
        repositories: Option<PathBuf>,

        /// Application categories JSON file
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Output HTML file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The config file carries the [logging] section, so it is read first
    let loaded = load_config(cli.config.as_ref());
    let logging = logging_config(loaded.as_ref().ok().map(|l| &l.config), cli.verbose);

    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting dashgen v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli, loaded).await {
        e.log();
        eprintln!("❌ {}", e);
        if let Some(context) = e.context() {
            for suggestion in &context.recovery_suggestions {
                eprintln!("   hint: {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, loaded: DashgenResult<LoadedConfig>) -> DashgenResult<()> {
    match cli.command {
        Commands::Generate {
            token,
            branch,
            repositories,
            categories,
            output,
        } => {
            let LoadedConfig { config, source } = loaded?;
            match source {
                Some(path) => info!("Loaded configuration from {:?}", path),
                None => info!("No configuration file found, using defaults"),
            }

            let token = token.or_else(|| std::env::var(TOKEN_ENV).ok());
            let options = GenerateOptions {
                token,
                branch,
                repositories: repositories.unwrap_or_else(|| config.input.repositories.clone()),
                categories: categories.unwrap_or_else(|| config.input.categories.clone()),
                output: output.unwrap_or_else(|| config.output.path.clone()),
            };
            handle_generate(options, &config).await
        }
        // Loads on its own: --init must work before any file exists
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(show, init, validate, cli.config.as_ref()),
    }
}

struct GenerateOptions {
    token: Option<String>,
    branch: Option<String>,
    repositories: PathBuf,
    categories: PathBuf,
    output: PathBuf,
}

/// A validated configuration and the file it came from
struct LoadedConfig {
    config: DashgenConfig,
    source: Option<PathBuf>,
}

/// Logging settings from the config file, or defaults when it could not be loaded
fn logging_config(config: Option<&DashgenConfig>, verbose: bool) -> LoggingConfig {
    let logging = config.map(|c| c.logging.clone()).unwrap_or_default();
    if verbose {
        logging.with_verbose()
    } else {
        logging
    }
}

/// Default configuration file locations; the first one that exists wins, so
/// a project-local `dashgen.toml` shadows the user-wide file
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("dashgen.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("dashgen").join("config.toml"));
    }
    paths
}

fn load_config(config_path: Option<&PathBuf>) -> DashgenResult<LoadedConfig> {
    let source = match config_path {
        Some(path) => Some(path.clone()),
        None => default_config_paths().into_iter().find(|path| path.exists()),
    };

    let config = match &source {
        Some(path) => DashgenConfig::from_file(path)?,
        None => DashgenConfig::default(),
    };

    config.validate()?;
    Ok(LoadedConfig { config, source })
}

async fn handle_generate(options: GenerateOptions, config: &DashgenConfig) -> DashgenResult<()> {
    log_operation_start!("generate_dashboard",
        repositories = %options.repositories.display(),
        output = %options.output.display()
    );

    if options.token.is_none() {
        info!("No access token given, using unauthenticated API requests");
    }

    let descriptors = load_repository_descriptors(&options.repositories).map_err(|e| {
        log_operation_error!("load_repositories", e);
        e
    })?;
    let catalog = load_category_descriptors(&options.categories).map_err(|e| {
        log_operation_error!("load_categories", e);
        e
    })?;
    info!(
        repositories = descriptors.len(),
        categories = catalog.len(),
        "Loaded input descriptors"
    );

    let pipeline =
        DashboardPipeline::github(config, options.token)?.with_preferred_branch(options.branch);

    let data = measure_async("collect_dashboard_data", pipeline.run(&descriptors, &catalog))
        .await
        .map_err(|e| {
            log_operation_error!("collect_dashboard_data", e);
            e
        })?;

    let html = report::render_dashboard(&config.output.title, &data, Utc::now())?;
    report::write_dashboard(&options.output, &html)
        .await
        .map_err(|e| {
            log_operation_error!("write_dashboard", e, output = %options.output.display());
            e
        })?;

    log_operation_success!("generate_dashboard",
        repositories = data.repositories.len(),
        examples = data.examples.len(),
        output = %options.output.display()
    );

    println!("✅ HTML report generated successfully: {}", options.output.display());
    Ok(())
}

fn handle_config(
    show: bool,
    init: bool,
    validate: bool,
    config_path: Option<&PathBuf>,
) -> DashgenResult<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => dirs::config_dir()
                .map(|dir| dir.join("dashgen").join("config.toml"))
                .ok_or_else(|| {
                    config_error!(
                        "Could not determine the user configuration directory",
                        "cli",
                        suggestion = "Pass an explicit path with --config"
                    )
                })?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        DashgenConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
    }

    if show {
        let LoadedConfig { config, .. } = load_config(config_path)?;
        let rendered = toml::to_string_pretty(&config).map_err(|e| DashgenError::Config {
            message: format!("Failed to serialize configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("config_show"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        match load_config(config_path) {
            Ok(_) => println!("✅ Configuration is valid"),
            Err(e) => {
                error!(error = %e, "Configuration validation failed");
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
