// ABOUTME: Entry point for the appdeploy CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use appdeploy::config::{self, Config};
use appdeploy::error::{Error, Result};
use appdeploy::output::{Output, OutputMode};
use appdeploy::pipeline;
use clap::Parser;
use cli::{Cli, Commands, OutputArgs};
use secrecy::ExposeSecret;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            println!("Created {}", config::CONFIG_FILENAME);
            Ok(())
        }
        Commands::Deploy { workspace, output } => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let workspace = workspace.unwrap_or(cwd);
            deploy(&config, &workspace, output_mode(&output)).await
        }
        Commands::Profile => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            let sink = Arc::new(Output::new(OutputMode::Normal));
            let profile =
                pipeline::fetch_profile(&config, &cwd, sink, pipeline::client_cache(&config))
                    .await?;
            println!("FTP URL:  {}", profile.ftp_url);
            println!("Username: {}", profile.ftp_username);
            if profile.ftp_password.expose_secret().is_empty() {
                println!("Password: <empty>");
            } else {
                println!("Password: <hidden>");
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, cwd: &Path) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(cwd),
    }
}

fn output_mode(args: &OutputArgs) -> OutputMode {
    if args.json {
        OutputMode::Json
    } else if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}

async fn deploy(config: &Config, workspace: &Path, mode: OutputMode) -> Result<()> {
    let mut output = Output::new(mode);
    output.start_timer();
    let output = Arc::new(output);

    let state = pipeline::deploy(
        config,
        workspace,
        output.clone(),
        pipeline::client_cache(config),
        pipeline::ftp_sessions(config),
    )
    .await?;

    if state.is_error() {
        return Err(Error::DeploymentFailed);
    }

    output.success("Deployment complete!");
    Ok(())
}
