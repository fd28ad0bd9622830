use anyhow::{Context, Result};
use inmo_market::messaging::contact_link;
use inmo_market::search::FilterCriteria;
use inmo_market::services::ListingService;
use inmo_market::store::{DocumentStore, MemoryObjects, MemoryStore, ObjectStore, RestObjects, RestStore};
use inmo_market::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Usage: inmo-market ["operacion=venta&dormitorios=2"] [--save results.json]
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Inmo Market - listing search");
    info!("==============================");

    let config = Config::load().context("Invalid configuration")?;

    let mut query = String::new();
    let mut save_to: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--save" {
            save_to = Some(PathBuf::from(args.next().context("--save needs a file path")?));
        } else {
            query = arg;
        }
    }

    let store: Arc<dyn DocumentStore> = match (&config.store_url, &config.seed_file) {
        (Some(url), _) => {
            info!("Using document store at {}", url);
            Arc::new(RestStore::new(url, config.store_token.clone(), config.http_timeout)?)
        }
        (None, Some(seed)) => Arc::new(MemoryStore::from_seed_file(seed).await?),
        (None, None) => {
            info!("No INMO_STORE_URL or INMO_SEED_FILE set, starting with an empty store");
            Arc::new(MemoryStore::new())
        }
    };
    let objects: Arc<dyn ObjectStore> = match &config.storage_url {
        Some(url) => Arc::new(RestObjects::new(url, config.store_token.clone(), config.http_timeout)?),
        None => Arc::new(MemoryObjects::new()),
    };

    let criteria = FilterCriteria::from_query(&query);
    info!("Searching with {} active filters ({})", criteria.active_count(), criteria.to_query());

    let listings = ListingService::new(store.clone(), objects);
    let results = listings
        .search(&criteria)
        .await
        .context("Search failed")?;

    info!("✅ Found {} listings\n", results.len());

    for (i, listing) in results.iter().enumerate() {
        let star = if listing.is_promoted { " ⭐" } else { "" };
        println!("{}. {} ({}){}", i + 1, listing.title, listing.display_price(), star);
        println!(
            "   {} dorm, {} baños, {} m²",
            listing.bedrooms_or_zero(),
            listing.bathrooms_or_zero(),
            listing.area.unwrap_or(0.0)
        );
        if !listing.location.is_empty() {
            println!("   Ubicación: {}", listing.location);
        }
        println!("   Agente: {}", listing.agent_name);
        println!("   ID: {}", listing.id);
        let agent = store.user(&listing.agent_id).await.unwrap_or_else(|e| {
            warn!("Could not load agent {}: {}", listing.agent_id, e);
            None
        });
        if let Some(link) = agent
            .and_then(|a| contact_link(&a, listing, &config.public_url, &config.whatsapp_prefix))
        {
            println!("   WhatsApp: {}", link);
        }
        println!();
    }

    if let Some(path) = save_to {
        let json = serde_json::to_string_pretty(&results)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved results to {}", path.display());
    }

    Ok(())
}
