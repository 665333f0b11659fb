mod cli;
mod commands;
mod error;
mod highlight;
mod mcp;
mod page_range;
mod pdf;
mod web;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use highlight::Palette;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn load_palette(path: Option<&Path>) -> Result<Palette> {
    match path {
        Some(path) => Palette::load(path),
        None => Ok(Palette::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            max_upload_bytes,
        } => {
            web::run_server(web::ServerConfig {
                bind,
                max_upload_bytes,
            })
            .await?;
        }
        Commands::Number { path, output } => {
            commands::number::run(&path, &output)?;
        }
        Commands::Split {
            path,
            pages,
            output,
        } => {
            commands::split::run(&path, &pages, &output)?;
        }
        Commands::Highlights {
            folder,
            suffix,
            palette,
            tolerance,
        } => {
            let mut config = commands::highlights::HighlightConfig::new(folder);
            config.suffix = suffix;
            config.palette = load_palette(palette.as_deref())?;
            if let Some(tolerance) = tolerance {
                config.palette.tolerance = tolerance;
            }
            commands::highlights::run(&config)?;
        }
        Commands::Mcp { palette } => {
            mcp::run_server(load_palette(palette.as_deref())?).await?;
        }
    }

    Ok(())
}
