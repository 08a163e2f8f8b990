//! `sp init`: create the `.stockpile/` directory, config and database.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;

use stockpile_core::Store;
use stockpile_core::config::{ProjectConfig, STOCKPILE_DIR};
use stockpile_core::db::migrations::LATEST_SCHEMA_VERSION;

use crate::context::Ctx;
use crate::output::render;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `.stockpile/config.toml` with defaults even if it exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "*.db\n*.db-wal\n*.db-shm\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    database: String,
    config: String,
    schema_version: u32,
    config_written: bool,
}

/// Execute `sp init`. Creates the store skeleton:
///
/// ```text
/// .stockpile/
///   config.toml     (default project config, unless present)
///   .gitignore      (database files)
///   stockpile.db    (migrated SQLite store)
/// ```
///
/// Running it again migrates an existing database and leaves its rows alone.
///
/// # Errors
///
/// Returns an error if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, ctx: &Ctx) -> Result<()> {
    let dir = ctx.root().join(STOCKPILE_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join("config.toml");
    let config_written = args.force || !config_path.exists();
    if config_written {
        let body = toml::to_string_pretty(&ProjectConfig::default())
            .context("Failed to serialize default config")?;
        std::fs::write(&config_path, body)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, GITIGNORE)
            .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;
    }

    let store = Store::init(&ctx.db_path(), ctx.config().project.store.busy_timeout())?;
    tracing::info!(path = %store.path().display(), "stockpile initialized");

    let payload = InitOutput {
        database: store.path().display().to_string(),
        config: config_path.display().to_string(),
        schema_version: LATEST_SCHEMA_VERSION,
        config_written,
    };

    render(ctx.output(), &payload, |value, w| {
        writeln!(w, "✓ Initialized stockpile store.")?;
        writeln!(w)?;
        writeln!(w, "  Database: {}", value.database)?;
        writeln!(w, "  Config:   {}", value.config)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  export STOCKPILE_ACTOR=<your id>")?;
        writeln!(w, "  sp deposit \"Scrap\" 500")
    })
}
