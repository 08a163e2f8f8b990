//! Per-invocation state shared by command handlers.

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use stockpile_core::config::EffectiveConfig;
use stockpile_core::{ActorId, ErrorCode, Store};

use crate::actor;
use crate::output::{CliError, OutputMode};

pub struct Ctx {
    root: PathBuf,
    config: EffectiveConfig,
    output: OutputMode,
    actor_flag: Option<ActorId>,
}

impl Ctx {
    pub const fn new(
        root: PathBuf,
        config: EffectiveConfig,
        output: OutputMode,
        actor_flag: Option<ActorId>,
    ) -> Self {
        Self {
            root,
            config,
            output,
            actor_flag,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn output(&self) -> OutputMode {
        self.output
    }

    pub const fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.project.store.database_path(&self.root)
    }

    pub const fn search_limit(&self) -> u32 {
        self.config.project.lookup.search_limit
    }

    pub const fn holders_limit(&self) -> u32 {
        self.config.project.lookup.holders_limit
    }

    /// Open the store created by `sp init`.
    pub fn store(&self) -> Result<Store> {
        let path = self.db_path();
        match Store::open_existing(&path, self.config.project.store.busy_timeout())? {
            Some(store) => Ok(store),
            None => Err(CliError::with_details(
                format!("no stockpile database at {}", path.display()),
                ErrorCode::NotInitialized.hint().unwrap_or_default(),
                ErrorCode::NotInitialized.code(),
            )
            .into()),
        }
    }

    pub fn connect(&self) -> Result<Connection> {
        self.store()?.connect()
    }

    pub fn actor(&self) -> Result<ActorId> {
        Ok(actor::require_actor(self.actor_flag, self.config.user.actor)?)
    }
}
