#![allow(clippy::multiple_crate_versions)]

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use modelfetch::assets::registry::FAMILIES;
use modelfetch::assets::{AssetDescriptor, AssetManifest, ModelFamily};
use modelfetch::config::Config;
use modelfetch::console::TerminalProgress;
use modelfetch::error::FetchError;
use modelfetch::fetch::FetchManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modelfetch")]
#[command(about = "Download and verify model assets", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/modelfetch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download missing or invalid assets
    Fetch {
        #[command(flatten)]
        selection: Selection,

        /// Print the campaign report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report local asset state without touching the network
    Verify {
        #[command(flatten)]
        selection: Selection,
    },
    /// List built-in model families
    List,
    /// Print local paths of a model family's assets
    Path {
        /// Model family name
        #[arg(long)]
        model: String,

        /// Cache root override
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Selection {
    /// Built-in model family to fetch (repeatable)
    #[arg(long = "model")]
    models: Vec<String>,

    /// Asset list file (.json or .toml)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Cache root override
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.quiet { "warn" } else { "modelfetch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    match cli.command {
        Commands::Fetch { selection, json } => {
            apply_cache_dir(&mut config, selection.cache_dir.clone());
            run_fetch(&config, &selection, json, cli.quiet).await
        }
        Commands::Verify { selection } => {
            apply_cache_dir(&mut config, selection.cache_dir.clone());
            run_verify(&config, &selection).await
        }
        Commands::List => {
            run_list();
            Ok(())
        }
        Commands::Path { model, cache_dir } => {
            apply_cache_dir(&mut config, cache_dir);
            run_path(&config, &model)
        }
    }
}

fn apply_cache_dir(config: &mut Config, cache_dir: Option<PathBuf>) {
    if cache_dir.is_some() {
        config.cache.root = cache_dir;
    }
}

fn resolve_family(name: &str) -> modelfetch::Result<&'static ModelFamily> {
    ModelFamily::find(name).ok_or_else(|| {
        let hint = ModelFamily::suggest(name).map_or_else(
            || format!("Available: {}", ModelFamily::all_names().join(", ")),
            |suggestion| format!("Did you mean '{suggestion}'?"),
        );
        FetchError::NotFound(format!("Unknown model '{name}'. {hint}"))
    })
}

/// Collect descriptors from the selected families and asset list, in order
fn selected_assets(selection: &Selection) -> anyhow::Result<Vec<AssetDescriptor>> {
    let mut assets = Vec::new();
    for name in &selection.models {
        assets.extend(resolve_family(name)?.descriptors());
    }

    if let Some(path) = &selection.manifest {
        let manifest = AssetManifest::load(path)
            .with_context(|| format!("Failed to load asset list {}", path.display()))?;
        assets.extend(manifest.assets);
    }

    if assets.is_empty() {
        bail!("Nothing to do: pass --model NAME or --manifest FILE");
    }
    Ok(assets)
}

fn build_manager(config: &Config, selection: &Selection) -> anyhow::Result<FetchManager> {
    let mut manager = FetchManager::from_config(config)?;
    manager.add_files(selected_assets(selection)?)?;
    Ok(manager)
}

async fn run_fetch(
    config: &Config,
    selection: &Selection,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut manager = build_manager(config, selection)?;
    if config.progress.enabled && !quiet && !json {
        manager.subscribe(Arc::new(TerminalProgress::new()));
    }

    let cancel = manager.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling download");
            cancel.cancel();
        }
    });

    let report = manager.download().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    }

    report.into_result()?;
    Ok(())
}

async fn run_verify(config: &Config, selection: &Selection) -> anyhow::Result<()> {
    let mut manager = build_manager(config, selection)?;
    manager.refresh().await;

    for file in manager.files() {
        println!("{:<12} {}", file.state().to_string(), file.local_file().display());
    }

    if !manager.all_files_downloaded() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_list() {
    for family in FAMILIES {
        println!(
            "{:<10} {} file(s)  {}",
            family.name,
            family.assets.len(),
            family.description
        );
    }
}

fn run_path(config: &Config, model: &str) -> anyhow::Result<()> {
    let family = resolve_family(model)?;
    let cache_root = config.cache_root()?;
    for descriptor in family.descriptors() {
        println!("{}", descriptor.local_path(&cache_root)?.display());
    }
    Ok(())
}
