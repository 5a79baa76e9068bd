use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geogate::{CountryResolver, Filter, FilterConfig, MaxmindResolver, StaticResolver};

/// Check client addresses against an admission rule set
#[derive(Parser)]
#[command(name = "geogate")]
#[command(author, version, about = "IP and country based request-admission filter")]
struct Cli {
    /// Path to a TOML rule file
    #[arg(short, long, conflicts_with = "rules")]
    config: Option<PathBuf>,

    /// Inline directive block, e.g. "deny_countries RU CN"
    #[arg(short, long)]
    rules: Option<String>,

    /// Path to a MaxMind GeoIP2 country database
    #[arg(short, long)]
    geoip: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Client addresses to check
    #[arg(required = true)]
    addresses: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = match (&cli.config, &cli.rules) {
        (Some(path), _) => FilterConfig::load(path)?,
        (None, Some(block)) => {
            FilterConfig::from_block(block).context("Failed to parse rule block")?
        }
        (None, None) => FilterConfig::default(),
    };

    config.validate().context("Invalid rule set")?;
    let filter = Filter::compile(&config).context("Failed to compile rule set")?;

    let resolver: Box<dyn CountryResolver> = match &cli.geoip {
        Some(path) => Box::new(
            MaxmindResolver::open(path)
                .with_context(|| format!("Failed to open GeoIP database: {}", path.display()))?,
        ),
        None => Box::new(StaticResolver::new()),
    };

    for addr in &cli.addresses {
        let verdict = filter.decide_str(addr, resolver.as_ref());
        let outcome = if verdict.allowed { "allow" } else { "deny" };
        println!("{addr}\t{}\t{outcome}", verdict.country);
    }

    Ok(())
}
