//! Per-actor quantity ledger.
//!
//! One row per (actor, item) with a strictly positive quantity. A balance
//! that reaches zero is deleted, never stored. Every mutation runs inside a
//! single `BEGIN IMMEDIATE` transaction, so the read of the current balance
//! and the write of the new one cannot interleave with another writer.

use rusqlite::{Connection, OptionalExtension, Rows, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::now_us;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{ActorId, ItemId};
use crate::registry;
use crate::sheet::{RejectedLine, SheetOutcome, StockSheet};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One item held by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub item: String,
    pub quantity: i64,
}

/// One actor holding a given item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderRow {
    pub actor: ActorId,
    pub quantity: i64,
}

/// Balances after a successful withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    /// What the actor still holds of the item.
    pub remaining: i64,
    /// What all actors together hold of the item.
    pub global_total: i64,
}

/// Result of an exact overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetOutcome {
    /// Balance before the overwrite (informational only).
    pub previous: i64,
    pub quantity: i64,
}

/// How a stock sheet is applied to an actor's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetMode {
    /// Each line is deposited on top of the current balance.
    #[default]
    Add,
    /// Each line replaces the current balance.
    Overwrite,
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Add `amount` of `item_name` to `actor`'s balance, creating the item if
/// needed. Returns the actor's new balance.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] when `amount <= 0` or the new
/// balance would overflow, [`LedgerError::InvalidName`] for a blank name, or
/// [`LedgerError::Store`].
pub fn deposit(
    conn: &mut Connection,
    actor: ActorId,
    item_name: &str,
    amount: i64,
) -> LedgerResult<i64> {
    require_positive(amount)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let item = registry::resolve_or_create(&tx, item_name)?;
    if balance_of(&tx, actor, item)?.checked_add(amount).is_none() {
        return Err(LedgerError::InvalidAmount {
            amount,
            reason: "balance would exceed the largest storable quantity",
        });
    }
    let balance: i64 = tx.query_row(
        "INSERT INTO ledger (actor_id, item_id, quantity, updated_at_us)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (actor_id, item_id) DO UPDATE SET
             quantity = ledger.quantity + excluded.quantity,
             updated_at_us = excluded.updated_at_us
         RETURNING quantity",
        params![actor, item.0, amount, now_us()],
        |row| row.get(0),
    )?;
    tx.commit()?;

    debug!(actor, item = item_name, amount, balance, "deposit");
    Ok(balance)
}

/// Remove `amount` of `item_name` from `actor`'s balance.
///
/// The withdrawal is all-or-nothing: when the actor holds less than
/// `amount`, nothing changes and the error carries the real balance.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] when `amount <= 0`,
/// [`LedgerError::UnknownItem`] if the item was never created,
/// [`LedgerError::InsufficientStock`] on over-withdrawal, or
/// [`LedgerError::Store`].
pub fn withdraw(
    conn: &mut Connection,
    actor: ActorId,
    item_name: &str,
    amount: i64,
) -> LedgerResult<Withdrawal> {
    require_positive(amount)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let item = registry::require(&tx, item_name)?;

    let emptied = tx.execute(
        "DELETE FROM ledger WHERE actor_id = ?1 AND item_id = ?2 AND quantity = ?3",
        params![actor, item.0, amount],
    )?;

    let remaining = if emptied == 1 {
        0
    } else {
        let decremented: Option<i64> = tx
            .query_row(
                "UPDATE ledger
                 SET quantity = quantity - ?3, updated_at_us = ?4
                 WHERE actor_id = ?1 AND item_id = ?2 AND quantity > ?3
                 RETURNING quantity",
                params![actor, item.0, amount, now_us()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(remaining) = decremented {
            remaining
        } else {
            let available = balance_of(&tx, actor, item)?;
            return Err(LedgerError::InsufficientStock {
                item: item_name.trim().to_string(),
                available,
                requested: amount,
            });
        }
    };

    let global_total = total_of(&tx, item)?;
    tx.commit()?;

    debug!(actor, item = item_name, amount, remaining, global_total, "withdraw");
    Ok(Withdrawal {
        remaining,
        global_total,
    })
}

/// Overwrite `actor`'s balance of `item_name` with `quantity`.
///
/// A quantity of zero deletes the row; it does not create an item that was
/// never seen. The reported `previous` balance is read inside the same
/// transaction but is informational only.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] when `quantity < 0`,
/// [`LedgerError::InvalidName`] for a blank name, or [`LedgerError::Store`].
pub fn set_exact(
    conn: &mut Connection,
    actor: ActorId,
    item_name: &str,
    quantity: i64,
) -> LedgerResult<SetOutcome> {
    if quantity < 0 {
        return Err(LedgerError::InvalidAmount {
            amount: quantity,
            reason: "quantity cannot be negative",
        });
    }
    let name = registry::clean_name(item_name)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let previous = if quantity == 0 {
        match registry::resolve(&tx, name)? {
            Some(item) => {
                let previous = balance_of(&tx, actor, item)?;
                tx.execute(
                    "DELETE FROM ledger WHERE actor_id = ?1 AND item_id = ?2",
                    params![actor, item.0],
                )?;
                previous
            }
            None => 0,
        }
    } else {
        let item = registry::resolve_or_create(&tx, name)?;
        let previous = balance_of(&tx, actor, item)?;
        tx.execute(
            "INSERT INTO ledger (actor_id, item_id, quantity, updated_at_us)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (actor_id, item_id) DO UPDATE SET
                 quantity = excluded.quantity,
                 updated_at_us = excluded.updated_at_us",
            params![actor, item.0, quantity, now_us()],
        )?;
        previous
    };
    tx.commit()?;

    debug!(actor, item = name, previous, quantity, "set exact balance");
    Ok(SetOutcome { previous, quantity })
}

/// Delete every ledger row. Item, recipe and project definitions survive.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the delete fails.
pub fn wipe_all(conn: &Connection) -> LedgerResult<usize> {
    let removed = conn.execute("DELETE FROM ledger", [])?;
    info!(removed, "wiped all ledger entries");
    Ok(removed)
}

/// Apply every line of `sheet` to `actor`'s ledger.
///
/// Each line commits on its own. Lines that fail (bad amount, blank name)
/// are collected alongside the lines the sheet parser already rejected.
///
/// # Errors
///
/// Only infrastructure failures abort the batch; they are returned as
/// [`LedgerError::Store`].
pub fn apply_sheet(
    conn: &mut Connection,
    actor: ActorId,
    sheet: &StockSheet,
    mode: SheetMode,
) -> LedgerResult<SheetOutcome> {
    let mut outcome = SheetOutcome::from_rejected(sheet);

    for line in sheet.lines() {
        let result = match mode {
            SheetMode::Add => deposit(conn, actor, &line.item, line.quantity).map(drop),
            SheetMode::Overwrite => set_exact(conn, actor, &line.item, line.quantity).map(drop),
        };
        match result {
            Ok(()) => outcome.applied += 1,
            Err(err @ LedgerError::Store(_)) => return Err(err),
            Err(err) => {
                warn!(actor, line = line.line, error = %err, "skipping stock sheet line");
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

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// `actor`'s balance of `item_name`, zero when absent or unknown.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn balance(conn: &Connection, actor: ActorId, item_name: &str) -> LedgerResult<i64> {
    match registry::resolve(conn, item_name)? {
        Some(item) => balance_of(conn, actor, item),
        None => Ok(0),
    }
}

/// Everything `actor` holds, ordered by item name.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn total_for(conn: &Connection, actor: ActorId) -> LedgerResult<Vec<Holding>> {
    let mut stmt = conn.prepare(
        "SELECT i.name, l.quantity
         FROM ledger l
         JOIN items i ON i.item_id = l.item_id
         WHERE l.actor_id = ?1 AND l.quantity > 0
         ORDER BY i.name",
    )?;
    let rows = stmt
        .query_map(params![actor], |row| {
            Ok(Holding {
                item: row.get(0)?,
                quantity: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Sum of every actor's balance of `item_name`; zero when unknown or unheld.
///
/// The sum saturates at `i64::MAX`.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn global_total(conn: &Connection, item_name: &str) -> LedgerResult<i64> {
    let mut stmt = conn.prepare(
        "SELECT l.quantity
         FROM ledger l
         JOIN items i ON i.item_id = l.item_id
         WHERE i.name = ?1",
    )?;
    let total = saturating_sum(stmt.query(params![item_name.trim()])?)?;
    Ok(total)
}

/// Largest holders of `item_name`, descending by quantity (ties by actor).
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn top_holders(conn: &Connection, item_name: &str, limit: u32) -> LedgerResult<Vec<HolderRow>> {
    let mut stmt = conn.prepare(
        "SELECT l.actor_id, l.quantity
         FROM ledger l
         JOIN items i ON i.item_id = l.item_id
         WHERE i.name = ?1 AND l.quantity > 0
         ORDER BY l.quantity DESC, l.actor_id ASC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![item_name.trim(), limit], |row| {
            Ok(HolderRow {
                actor: row.get(0)?,
                quantity: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const fn require_positive(amount: i64) -> LedgerResult<()> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount {
            amount,
            reason: "amount must be positive",
        });
    }
    Ok(())
}

fn balance_of(conn: &Connection, actor: ActorId, item: ItemId) -> LedgerResult<i64> {
    let quantity = conn
        .query_row(
            "SELECT quantity FROM ledger WHERE actor_id = ?1 AND item_id = ?2",
            params![actor, item.0],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(quantity.unwrap_or(0))
}

fn total_of(conn: &Connection, item: ItemId) -> LedgerResult<i64> {
    let mut stmt = conn.prepare("SELECT quantity FROM ledger WHERE item_id = ?1")?;
    let total = saturating_sum(stmt.query(params![item.0])?)?;
    Ok(total)
}

/// SQLite's `SUM` raises on i64 overflow, so pooled totals are added here.
fn saturating_sum(mut rows: Rows<'_>) -> LedgerResult<i64> {
    let mut sum: i128 = 0;
    while let Some(row) = rows.next()? {
        sum += i128::from(row.get::<_, i64>(0)?);
    }
    Ok(i64::try_from(sum).unwrap_or(i64::MAX))
}
