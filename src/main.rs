//! Infill - a build-time content pipeline for static sites.

mod build;
mod cli;
mod config;
mod error;
mod generator;
mod inject;
mod logger;
mod mirror;
mod pipeline;
mod reload;
mod serve;
mod transform;
mod utils;
mod watch;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    let config = SiteConfig::load(cli)?;
    config::init_config(config);

    match &cli.command {
        Commands::Build { .. } => build_site(config::cfg()).map(|_| ()),
        Commands::Serve { .. } => serve_site(),
    }
}
