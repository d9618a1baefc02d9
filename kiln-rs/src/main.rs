//! Kiln CLI entry point.

use clap::Parser;
use kiln::cli::args::{Cli, Commands};
use kiln::cli::output::Output;
use kiln::cli::{backlinks, generate, graph, query, render, resolve, view};
use kiln::config::BuildConfig;
use kiln::error::Result;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = BuildConfig::load(cli.vault_dir(), &cli.overrides())?;
    log::debug!("Using config {:?}", config);

    let output = Output::new(cli.output_format(), cli.quiet);

    match &cli.command {
        Commands::Generate(args) => generate::run(&config, args, &output),
        Commands::Resolve(args) => resolve::run(&config, args, &output),
        Commands::Backlinks(args) => backlinks::run(&config, args, &output),
        Commands::Graph(args) => graph::run(&config, args, &output),
        Commands::Query(args) => query::run(&config, args, &output),
        Commands::View(args) => view::run(&config, args, &output),
        Commands::Render(args) => render::run(&config, args, &output),
    }
}
