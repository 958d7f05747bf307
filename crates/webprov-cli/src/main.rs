//! Webprov - single-host web site provisioner
//!
//! Usage:
//!   webprov                    # Provision the configured site
//!   webprov --config FILE      # Provision with overrides from FILE
//!   webprov deploy             # Re-sync the webroot now

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webprov_core::config::{ConfigFile, SiteConfig};
use webprov_core::error::ProvisionError;
use webprov_core::host::{HostPaths, SystemRunner};
use webprov_core::pipeline::{Provisioner, Redeployer};

#[derive(Parser)]
#[command(name = "webprov")]
#[command(about = "Provision a web server, push-to-deploy hook and certificate for one site", long_about = None)]
struct Cli {
    /// Read overrides from this webprov.toml instead of the default location
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull the latest commit into the webroot and record it in the deploy log
    Deploy,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webprov=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("✗ error: {}", err);
            if let Some(hint) = err.remediation() {
                eprintln!("  To finish this step by hand: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ProvisionError> {
    let site = load_site(cli.config)?;
    let runner = SystemRunner::new();
    let paths = HostPaths::system();

    match cli.command {
        None => {
            let report = Provisioner::new(&runner, &site, &paths).run()?;
            println!("{}", report.render_summary());
        }
        Some(Commands::Deploy) => {
            let outcome = Redeployer::new(&runner, &site, &paths).run()?;
            println!("✓ {}: {}", site.domain(), outcome.describe());
        }
    }
    Ok(())
}

fn load_site(explicit: Option<PathBuf>) -> Result<SiteConfig, ProvisionError> {
    let path = explicit.or_else(ConfigFile::discover);
    let file = match &path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            ConfigFile::load(path)?
        }
        None => ConfigFile::default(),
    };
    Ok(file.into_site_config()?)
}
