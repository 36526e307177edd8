//! # Larek Storefront Library
//!
//! Wires configuration, logging and the HTTP catalog into a [`Storefront`]
//! and reports what was loaded.
//!
//! ## Module Organization
//! ```text
//! larek_storefront/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! └── error.rs        ◄─── Startup error type
//! ```

pub mod error;

use std::path::PathBuf;
use std::sync::Arc;

use larek_core::{AppState, Product};
use larek_engine::{HttpCatalogSource, Storefront, StorefrontConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use error::AppResult;

/// Shown instead of a price for products that are not for sale.
pub const PRICELESS: &str = "Priceless";

/// Runs the headless storefront.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Storefront Startup                                │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: info, larek=debug; override with RUST_LOG                │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • explicit path, else the platform config dir, else defaults        │
/// │     • LAREK_* environment overrides                                     │
/// │                                                                         │
/// │  3. Build Storefront ─────────────────────────────────────────────────► │
/// │     • HttpCatalogSource against the configured API origin               │
/// │     • Event handlers and validators registered                          │
/// │                                                                         │
/// │  4. Initialize ───────────────────────────────────────────────────────► │
/// │     • Forced catalog load, app:ready                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config_path: Option<PathBuf>) -> AppResult<()> {
    init_tracing();

    info!("Starting Larek storefront");

    let config = match config_path {
        Some(path) => StorefrontConfig::load(Some(path))?,
        None => StorefrontConfig::load_or_default(None),
    };
    info!(api = %config.api.origin, "Configuration loaded");

    let source = HttpCatalogSource::new(&config.api)?;
    let storefront = Storefront::new(config, Arc::new(source));

    storefront.initialize().await?;

    let state = storefront.state();
    if let Some(error) = &state.catalog.error {
        warn!(%error, "Storefront started without a catalog");
    }
    println!("{}", render_catalog(&state));

    storefront.destroy().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=larek_engine=trace` - Show trace for the engine only
/// - Default: info, debug for larek crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,larek=debug,reqwest=warn"));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// One line per product plus the basket summary.
pub fn render_catalog(state: &AppState) -> String {
    let mut lines: Vec<String> = state.catalog.items.iter().map(render_product).collect();

    if lines.is_empty() {
        lines.push("(catalog is empty)".to_string());
    }
    lines.push(format!(
        "basket: {} item(s), {}",
        state.basket.len(),
        state.basket.total
    ));
    lines.join("\n")
}

fn render_product(product: &Product) -> String {
    let price = product
        .price
        .map(|p| p.to_string())
        .unwrap_or_else(|| PRICELESS.to_string());
    format!("{:<40} {:<14} {}", product.title, product.category, price)
}
