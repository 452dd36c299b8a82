use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use recipe_fetch::client::RecipeClient;
use recipe_fetch::config;
use recipe_fetch::model::Recipe;
use recipe_fetch::service::{LoadState, RecipeService, Snapshot};
use recipe_fetch::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List recipes, from the local store when it has any
    List,
    /// Clear the local store and fetch the catalog again
    Refresh,
    /// Show one stored recipe
    Show { id: String },
    /// Write an example config file
    InitConfig {
        #[arg(default_value = "config.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.command {
        Command::InitConfig { path } => {
            std::fs::write(&path, config::example())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Command::List => {
            let service = open_service(&args.config).await?;
            print_snapshot(&service.load().await);
        }
        Command::Refresh => {
            let service = open_service(&args.config).await?;
            info!("refreshing recipe catalog");
            print_snapshot(&service.refresh().await);
        }
        Command::Show { id } => {
            let service = open_service(&args.config).await?;
            match service.find(&id).await? {
                Some(recipe) => print_recipe(&recipe),
                None => println!("no stored recipe with id {}", id),
            }
        }
    }
    Ok(())
}

async fn open_service(config_path: &Path) -> Result<RecipeService> {
    let cfg = config::load(Some(config_path))?;
    cfg.ensure_dirs()?;
    let store = SqliteStore::open(&cfg.database_url()).await?;
    let client = RecipeClient::from_config(&cfg.remote)?;
    Ok(RecipeService::new(Arc::new(client), Arc::new(store)))
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.name);
    println!("  cuisine: {}", recipe.cuisine);
    if let Some(photo) = recipe.large_photo().or(recipe.small_photo()) {
        println!("  photo:   {}", photo);
    }
    if let Some(url) = recipe.source_link() {
        println!("  source:  {}", url);
    }
    if let Some(url) = recipe.youtube_link() {
        println!("  youtube: {}", url);
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    match &snapshot.state {
        LoadState::Ready(origin) => println!("{} recipes ({:?})", snapshot.recipes.len(), origin),
        LoadState::Failed(err) => println!("could not load recipes: {}", err),
        state => println!("{:?}", state),
    }
    if let Some(warning) = &snapshot.warning {
        println!("warning: {}", warning);
    }
    for r in snapshot.recipes.iter() {
        println!("  {:<40} {:<12} {}", r.name, r.cuisine, r.id);
    }
}
