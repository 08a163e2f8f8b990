//! Identity types shared by the registry, ledger and project tables.

use serde::{Deserialize, Serialize};

/// Opaque stable identity of a contributor, supplied by the caller.
pub type ActorId = i64;

/// Opaque identity of a guild (dashboard scope), supplied by the caller.
pub type GuildId = i64;

/// Stable identity of a registered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// Stable identity of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);
