// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "appdeploy")]
#[command(about = "Deploy web application artifacts to Azure App Service over FTP")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new appdeploy.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Upload the configured files to the web app
    Deploy {
        /// Directory the file patterns are resolved against (default: current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the FTP publishing profile of the web app
    Profile,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Only print errors and the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long)]
    pub json: bool,
}
