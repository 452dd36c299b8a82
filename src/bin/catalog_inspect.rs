use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use recipe_fetch::client::RecipeClient;
use recipe_fetch::config;

/// Fetch the remote catalog without touching the local store.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the configured endpoint
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    if args.endpoint.is_some() {
        cfg.remote.endpoint = args.endpoint;
    }
    let client = RecipeClient::from_config(&cfg.remote)?;

    let recipes = client.fetch_catalog().await?;
    let mut by_cuisine: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &recipes {
        *by_cuisine.entry(r.cuisine.as_str()).or_default() += 1;
    }
    let missing_source = recipes.iter().filter(|r| r.source_link().is_none()).count();
    let missing_video = recipes.iter().filter(|r| r.youtube_link().is_none()).count();

    println!("Endpoint: {}", client.endpoint().unwrap_or("<none>"));
    println!("Recipes: {}", recipes.len());
    println!("Without source link: {}", missing_source);
    println!("Without video: {}", missing_video);
    println!("By cuisine:");
    for (cuisine, n) in by_cuisine {
        println!("  {} -> {}", cuisine, n);
    }
    Ok(())
}
