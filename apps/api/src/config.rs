//! API service configuration.
//!
//! Layered: built-in defaults, then an optional `gearbox.toml` next to the
//! binary, then `GEARBOX_*` environment variables. Environment wins.
//!
//! ```text
//! GEARBOX_BIND_ADDR=0.0.0.0:9000 GEARBOX_DATABASE_PATH=/data/gearbox.db gearbox-api
//! ```

use serde::Deserialize;

/// Runtime configuration for the API service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// Connection pool size.
    pub max_connections: u32,

    /// Tax rate in basis points applied at checkout (1500 = 15%).
    pub tax_rate_bps: u32,

    /// Seed a small demo catalog on startup (local development only).
    pub seed_demo_catalog: bool,
}

impl ApiConfig {
    /// Loads configuration from defaults, `gearbox.toml`, and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::defaults()?
            .add_source(config::File::with_name("gearbox").required(false))
            .add_source(config::Environment::with_prefix("GEARBOX"))
            .build()?
            .try_deserialize()
    }

    /// Builder pre-populated with the built-in defaults, before any file or
    /// environment source is layered on top.
    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("database_path", "gearbox.db")?
            .set_default("max_connections", 5i64)?
            .set_default("tax_rate_bps", 1500i64)?
            .set_default("seed_demo_catalog", false)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Deliberately built from the defaults layer only: the full load() reads
    // the process environment and any gearbox.toml on disk, which would make
    // the assertions depend on the machine running the tests.
    #[test]
    fn test_defaults_load() {
        let cfg: ApiConfig = ApiConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.tax_rate_bps, 1500);
        assert!(!cfg.seed_demo_catalog);
    }
}
