// ABOUTME: Main entry point for the xkcd terminal viewer
// ABOUTME: Parses arguments, loads configuration and dispatches to the commands

use clap::Parser;
use owo_colors::OwoColorize;
use std::env;
use std::io::IsTerminal;
use termimg::TermImgError;
use xkcd_cli::cli::{Cli, Commands};
use xkcd_cli::config::Config;
use xkcd_cli::show::{run_show, run_update_cache};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let use_color = !cli.no_color
        && env::var("NO_COLOR").is_err()
        && env::var("TERM").unwrap_or_default() != "dumb"
        && std::io::stdout().is_terminal();

    if let Err(e) = run(cli, use_color).await {
        if use_color {
            eprintln!("{} {:#}", "error:".red().bold(), e);
        } else {
            eprintln!("error: {:#}", e);
        }
        let help = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<TermImgError>())
            .and_then(TermImgError::help_text);
        if let Some(help) = help {
            eprintln!("help: {}", help);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, use_color: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::UpdateCache { cache_path } => {
            run_update_cache(cache_path.as_deref(), &config).await
        }
        Commands::Show(args) => run_show(&args, &config, use_color).await,
    }
}
