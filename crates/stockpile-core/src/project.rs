//! Projects, their item requirements, and per-guild dashboard bindings.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{fold_fragment, now_us};
use crate::error::{LedgerError, LedgerResult};
use crate::model::{GuildId, ProjectId};
use crate::registry;
use crate::sheet::{RejectedLine, SheetOutcome, StockSheet};

/// One required item and how much of it the project needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub item: String,
    pub target: i64,
}

/// Where a guild's live status message lives and which project it shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardBinding {
    pub guild: GuildId,
    pub channel: i64,
    pub message: i64,
    pub project: String,
}

/// Create a new, empty project.
///
/// # Errors
///
/// Returns [`LedgerError::DuplicateProject`] if the name is taken,
/// [`LedgerError::InvalidName`] for a blank name, or [`LedgerError::Store`].
pub fn create(conn: &Connection, name: &str) -> LedgerResult<ProjectId> {
    let name = registry::clean_name(name)?;
    let id: Option<i64> = conn
        .query_row(
            "INSERT INTO projects (name, created_at_us) VALUES (?1, ?2)
             ON CONFLICT (name) DO NOTHING
             RETURNING project_id",
            params![name, now_us()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(id) = id else {
        return Err(LedgerError::DuplicateProject {
            name: name.to_string(),
        });
    };
    info!(project = name, id, "project created");
    Ok(ProjectId(id))
}

/// Look up a project by exact name.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn resolve(conn: &Connection, name: &str) -> LedgerResult<Option<ProjectId>> {
    let id = conn
        .query_row(
            "SELECT project_id FROM projects WHERE name = ?1",
            params![name.trim()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(ProjectId))
}

fn require(conn: &Connection, name: &str) -> LedgerResult<ProjectId> {
    resolve(conn, name)?.ok_or_else(|| LedgerError::UnknownProject {
        name: name.trim().to_string(),
    })
}

/// Project names containing `fragment`, case-insensitively.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn search(conn: &Connection, fragment: &str, limit: u32) -> LedgerResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM projects
         WHERE instr(casefold(name), ?1) > 0
         ORDER BY name
         LIMIT ?2",
    )?;
    let names = stmt
        .query_map(params![fold_fragment(fragment), limit], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Set how much of `item` the project needs, replacing any earlier target.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownProject`], [`LedgerError::InvalidAmount`]
/// for a negative target, [`LedgerError::InvalidName`], or
/// [`LedgerError::Store`].
pub fn add_requirement(
    conn: &mut Connection,
    project: &str,
    item: &str,
    target: i64,
) -> LedgerResult<()> {
    if target < 0 {
        return Err(LedgerError::InvalidAmount {
            amount: target,
            reason: "target cannot be negative",
        });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let project_id = require(&tx, project)?;
    let item_id = registry::resolve_or_create(&tx, item)?;
    tx.execute(
        "INSERT INTO requirements (project_id, item_id, target_amount)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (project_id, item_id) DO UPDATE SET
             target_amount = excluded.target_amount",
        params![project_id.0, item_id.0, target],
    )?;
    tx.commit()?;

    debug!(project, item, target, "requirement set");
    Ok(())
}

/// All requirements of a project, ordered by item name.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownProject`] or [`LedgerError::Store`].
pub fn requirements(conn: &Connection, project: &str) -> LedgerResult<Vec<Requirement>> {
    let project_id = require(conn, project)?;
    let mut stmt = conn.prepare(
        "SELECT i.name, r.target_amount
         FROM requirements r
         JOIN items i ON i.item_id = r.item_id
         WHERE r.project_id = ?1
         ORDER BY i.name",
    )?;
    let rows = stmt
        .query_map(params![project_id.0], |row| {
            Ok(Requirement {
                item: row.get(0)?,
                target: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Set every target listed in `sheet`. Lines commit independently.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownProject`] before touching anything when the
/// project is missing, or [`LedgerError::Store`] on infrastructure failure.
pub fn apply_requirement_sheet(
    conn: &mut Connection,
    project: &str,
    sheet: &StockSheet,
) -> LedgerResult<SheetOutcome> {
    require(conn, project)?;
    let mut outcome = SheetOutcome::from_rejected(sheet);

    for line in sheet.lines() {
        match add_requirement(conn, project, &line.item, line.quantity) {
            Ok(()) => outcome.applied += 1,
            Err(err @ LedgerError::Store(_)) => return Err(err),
            Err(err) => {
                warn!(project, line = line.line, error = %err, "skipping requirement line");
                outcome.failures.push(RejectedLine {
                    line: line.line,
                    text: line.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Point a guild's dashboard at `project`, replacing any earlier binding.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownProject`] or [`LedgerError::Store`].
pub fn bind_dashboard(
    conn: &Connection,
    guild: GuildId,
    channel: i64,
    message: i64,
    project: &str,
) -> LedgerResult<DashboardBinding> {
    let project_id = require(conn, project)?;
    conn.execute(
        "INSERT INTO dashboards (guild_id, channel_id, message_id, project_id)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (guild_id) DO UPDATE SET
             channel_id = excluded.channel_id,
             message_id = excluded.message_id,
             project_id = excluded.project_id",
        params![guild, channel, message, project_id.0],
    )?;

    info!(guild, channel, message, project, "dashboard bound");
    Ok(DashboardBinding {
        guild,
        channel,
        message,
        project: project.trim().to_string(),
    })
}

/// The dashboard binding for `guild`, if any.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn dashboard(conn: &Connection, guild: GuildId) -> LedgerResult<Option<DashboardBinding>> {
    let binding = conn
        .query_row(
            "SELECT d.guild_id, d.channel_id, d.message_id, p.name
             FROM dashboards d
             JOIN projects p ON p.project_id = d.project_id
             WHERE d.guild_id = ?1",
            params![guild],
            |row| {
                Ok(DashboardBinding {
                    guild: row.get(0)?,
                    channel: row.get(1)?,
                    message: row.get(2)?,
                    project: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(binding)
}
