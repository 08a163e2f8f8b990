//! stockpile-core library.
//!
//! A shared ledger of fungible items contributed by many actors, plus the
//! readiness calculator that reports how far the pooled stock goes toward
//! each project's targets.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`LedgerResult`]; setup and config
//!   loading use `anyhow::Result` with context.
//! - **Logging**: `tracing` macros (`debug!` per mutation, `info!` for
//!   migrations, wipes and project creation).
//! - **Connections**: mutations take `&mut Connection` and run in one
//!   immediate transaction; reads take `&Connection`.

pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod model;
pub mod project;
pub mod readiness;
pub mod recipe;
pub mod registry;
pub mod sheet;

pub use db::Store;
pub use error::{ErrorCode, LedgerError, LedgerResult};
pub use model::{ActorId, GuildId, ItemId, ProjectId};
