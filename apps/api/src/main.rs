//! # Gearbox POS API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tracing init → config load → store connect (+ migrations)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppState (coordinator, refunds, catalog, sales)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  axum::serve on bind_addr, until SIGINT/SIGTERM                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gearbox_api::{build_router, ApiConfig, AppState};
use gearbox_core::Product;
use gearbox_store::{Store, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        database_path = %config.database_path,
        tax_rate_bps = config.tax_rate_bps,
        "configuration loaded"
    );

    let store = Store::connect(
        StoreConfig::new(&config.database_path).max_connections(config.max_connections),
    )
    .await
    .context("connecting to store")?;

    if config.seed_demo_catalog {
        seed_demo_catalog(&store).await?;
    }

    let state = Arc::new(AppState::new(store, config.tax_rate_bps));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("server shutdown complete");
    Ok(())
}

/// A handful of auto parts for local development.
async fn seed_demo_catalog(store: &Store) -> anyhow::Result<()> {
    let now = Utc::now();
    let demo = [
        ("BRK-001", "Brake Pad Set - Front", 10_000, 5, "set"),
        ("OIL-5W30", "Engine Oil 5W30 Synthetic", 4_500, 40, "litre"),
        ("AIR-220", "Air Filter", 2_200, 12, "piece"),
        ("SPK-IR7", "Iridium Spark Plug", 1_800, 32, "piece"),
    ];

    let catalog = store.catalog();
    for (sku, name, price, stock, unit) in demo {
        catalog
            .upsert(&Product {
                sku: sku.to_string(),
                name: name.to_string(),
                unit_price_cents: price,
                available_stock: stock,
                min_stock: 2,
                unit: unit.to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    info!(products = demo.len(), "demo catalog seeded");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
