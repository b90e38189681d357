mod commands;
mod common;
mod config;
mod context;
mod dotfiles;
mod error;
mod execution;
mod manifest;
mod orchestrator;
mod probe;
mod strategy;
mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::ProvisionError;
use crate::ui::prelude::*;

/// Provision an Arch workstation from a package manifest and a dotfiles repository
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debug events, including every command run
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Disable colored text output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install every manifest entry, then sync dotfiles
    Install {
        /// Manifest path or URL
        #[arg(short, long)]
        manifest: Option<String>,
        /// Account that owns checkouts and dotfiles
        #[arg(short, long)]
        user: Option<String>,
        /// Dotfiles repository URL
        #[arg(long)]
        dotfiles: Option<String>,
        /// Dotfiles branch
        #[arg(short, long)]
        branch: Option<String>,
        /// Print commands instead of running them
        #[arg(long)]
        dry_run: bool,
        /// Stop after the package stage
        #[arg(long)]
        skip_dotfiles: bool,
    },

    /// Show how each manifest entry would be installed
    Plan {
        /// Manifest path or URL
        #[arg(short, long)]
        manifest: Option<String>,
    },

    /// Sync the dotfiles repository only
    Dotfiles {
        /// Account that owns the dotfiles
        #[arg(short, long)]
        user: Option<String>,
        /// Dotfiles repository URL
        #[arg(short, long)]
        repository: Option<String>,
        /// Dotfiles branch
        #[arg(short, long)]
        branch: Option<String>,
        /// Print commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    let result = match cli.command {
        Commands::Install {
            manifest,
            user,
            dotfiles,
            branch,
            dry_run,
            skip_dotfiles,
        } => commands::handle_install(
            &cli.config,
            commands::InstallArgs {
                manifest,
                user,
                dotfiles,
                branch,
                dry_run,
                skip_dotfiles,
            },
        ),
        Commands::Plan { manifest } => commands::handle_plan(&cli.config, manifest),
        Commands::Dotfiles {
            user,
            repository,
            branch,
            dry_run,
        } => commands::handle_dotfiles(&cli.config, user, repository, branch, dry_run),
    };

    if let Err(e) = result {
        let message = match e.downcast_ref::<ProvisionError>() {
            Some(fatal) => format!(
                "{} {} stage failed: {}",
                char::from(NerdFont::Cross),
                fatal.stage(),
                fatal
            ),
            None => format!("{} {:#}", char::from(NerdFont::Cross), e),
        };
        emit(Level::Error, "riceup.fatal", &message, None);
        std::process::exit(1);
    }
}
