//! plugin-docs CLI - resolve plugin documentation URLs into embeddable HTML
//!
//! Thin process wiring around [`plugin_docs_core::WikiService`]: parse flags,
//! set up logging, load configuration, run one command.

use anyhow::{Context, Result};
use clap::Parser;
use plugin_docs_core::{Config, WikiService};

mod cli;
mod logging;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::initialize_logging(&cli)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let service = WikiService::new(&config).context("Failed to initialize documentation service")?;

    execute_command(&cli.command, &service).await;
    Ok(())
}

async fn execute_command(command: &Commands, service: &WikiService) {
    match command {
        Commands::Get { url } => {
            println!("{}", service.get_wiki_content(url).await);
        },
        Commands::Check { url } => {
            let verdict = if service.is_valid_wiki_url(url) {
                "valid"
            } else {
                "invalid"
            };
            println!("{verdict}");
        },
        Commands::Resolve { url } => match service.resolve(url) {
            Some(found) => {
                println!("kind:      {}", found.kind());
                println!("endpoint:  {}", found.endpoint());
                println!("directory: {}", found.directory());
                if let Some(repo) = found.repo() {
                    println!("repo:      {repo}");
                }
                if let Some(branch) = found.branch() {
                    println!("branch:    {branch}");
                }
                if let Some(page) = found.page() {
                    println!("page:      {page}");
                }
            },
            None => println!("no documentation source matches {url}"),
        },
    }
}
