// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use seekfs::engine::{ChatExpander, QueryExpander};
use seekfs::opener::SystemOpener;
use seekfs::shell::{render_hits, Shell};
use seekfs::storage::default_paths::well_known_locations;
use seekfs::{Config, DefaultPathRegistry, Embedder, FastEmbedder, RegistryCommand, SeekState, VariantCount};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seekfs", version, about = "File catalog and semantic file search")]
struct Cli {
    /// Config file (default: <config dir>/seekfs/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the roots into a fresh catalog
    Fetch {
        /// Crawl these roots instead of the configured ones
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
    },
    /// Embed every catalog name into the vector index
    Build {
        /// Only embed names the index does not hold yet
        #[arg(long)]
        resume: bool,
    },
    /// Re-crawl and embed only the new names
    Update,
    /// Fuzzy search by name or task
    Search {
        query: String,
        /// 30 matches per variant instead of 10
        #[arg(long)]
        broad: bool,
        /// Only launchable apps
        #[arg(long)]
        app: bool,
    },
    /// Search by exact name
    Find { name: String },
    /// Manage default paths (get, add, modify, delete)
    Paths {
        op: String,
        name: Option<String>,
        path: Option<String>,
    },
    /// Interactive shell
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Crawling, embedding and the blocking HTTP client all stay off the runtime threads.
    tokio::task::spawn_blocking(move || run(cli)).await??;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::info!("Data directory: {}", config.data_dir.display());

    // Registry edits need neither the catalog nor the model.
    if let Command::Paths { op, name, path } = &cli.command {
        let mut registry = DefaultPathRegistry::load(config.default_paths_path())?;
        registry.seed(well_known_locations())?;
        let command = RegistryCommand::new(op, name.as_deref(), path.as_deref())?;
        for (name, path) in registry.apply(command)? {
            println!("{} = {}", name, path);
        }
        return Ok(());
    }

    let embedder: Arc<dyn Embedder> = Arc::new(FastEmbedder::new(&config.embedding.model)?);
    let expander = build_expander(&config)?;
    let mut state = SeekState::open(config, embedder, expander)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Fetch { roots } => {
            let names = state.fetch(Some(roots.as_slice()))?;
            println!("Catalogued {} names", names);
        }
        Command::Build { resume } => {
            let n = state.build(resume)?;
            println!("Embedded {} names", n);
        }
        Command::Update => {
            let added = state.update(None)?;
            println!("{} new names", added.len());
        }
        Command::Search { query, broad, app } => {
            let count = if broad { VariantCount::Broad } else { VariantCount::Narrow };
            let outcome = state.search(&query, count, app)?;
            if !outcome.index_available {
                eprintln!("Vector index not built. Run 'seekfs fetch' then 'seekfs build'.");
            }
            render_hits(&mut stdout, &outcome.hits)?;
        }
        Command::Find { name } => {
            let outcome = state.find(&name)?;
            render_hits(&mut stdout, &outcome.hits)?;
        }
        Command::Shell => {
            let stdin = std::io::stdin().lock();
            Shell::new(&mut state, &SystemOpener).run(stdin, &mut stdout)?;
        }
        Command::Paths { .. } => {}
    }
    Ok(())
}

fn build_expander(config: &Config) -> Result<Option<Box<dyn QueryExpander>>> {
    let Some(endpoint) = config.expander.endpoint.as_deref() else {
        tracing::info!("Query expansion off (no expander.endpoint)");
        return Ok(None);
    };

    let api_key = std::env::var(&config.expander.api_key_env).ok();
    if api_key.is_none() {
        tracing::warn!("{} is not set; calling {} without a key", config.expander.api_key_env, endpoint);
    }
    let expander = ChatExpander::new(
        endpoint,
        &config.expander.model,
        api_key,
        Duration::from_secs(config.expander.timeout_secs),
    )?;
    Ok(Some(Box::new(expander)))
}
