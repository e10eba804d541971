#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Apply pending schema migrations to the calculations database.
//!
//! # Examples
//! ```sh
//! CALCULATIONS_DATABASE_URL=postgres://localhost/calculations \
//!     cargo run --manifest-path backend/Cargo.toml --bin migrate
//! ```

use std::env;

use backend::config::DatabaseSettings;
use backend::outbound::persistence::run_pending_migrations;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = DatabaseSettings::load_from_iter(env::args_os())
        .map_err(|err| eyre!("failed to load database settings: {err}"))?;
    let pool_config = settings.pool_config()?;

    let applied = run_pending_migrations(pool_config.database_url())
        .wrap_err("migration run failed")?;
    info!(applied, "database schema is up to date");
    Ok(())
}
