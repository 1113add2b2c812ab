use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use api_ingress::{ApiIngress, ApiIngressConfig, RestfulModule};
use users_info::{config::UsersInfoConfig, UsersInfo};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Users Server - minimal REST backend with an in-memory user directory
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - minimal REST backend with an in-memory user directory")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        home_dir = %config.server.home_dir,
        "Users Server starting"
    );

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

/// Typed module configs pulled from the `modules` bag.
fn module_configs(config: &AppConfig) -> Result<(ApiIngressConfig, UsersInfoConfig)> {
    let ingress = config.module_config::<ApiIngressConfig>("api_ingress")?;
    ingress
        .normalized_base_path()
        .context("Invalid api_ingress.base_path")?;
    let users = config.module_config::<UsersInfoConfig>("users_info")?;
    Ok((ingress, users))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let (ingress_cfg, users_cfg) = module_configs(&config)?;
    let modules: Vec<Arc<dyn RestfulModule>> = vec![Arc::new(UsersInfo::new(users_cfg))];

    let router = ApiIngress::new(ingress_cfg).build_router(&modules)?;
    let bind_addr = config.bind_addr();
    tracing::info!("Starting HTTP server on {}", bind_addr);

    api_ingress::serve(router, &bind_addr, async {
        if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
            tracing::error!(error = %e, "Signal handler failed; shutting down");
        }
    })
    .await?;

    tracing::info!("Users Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    module_configs(&config)?;
    config.server.socket_addr()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}
