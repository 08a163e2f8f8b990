//! Item registry: maps item names to stable identities.
//!
//! Names are stored exactly as first written (after trimming surrounding
//! whitespace) and are unique case-sensitively. Search is case-insensitive.

use rusqlite::{Connection, OptionalExtension, params};

use crate::db::{fold_fragment, now_us};
use crate::error::{LedgerError, LedgerResult};
use crate::model::{ActorId, ItemId};

/// Trim a user-supplied name and reject it when nothing is left.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidName`] for blank names.
pub fn clean_name(name: &str) -> LedgerResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidName {
            name: name.to_string(),
            reason: "name is blank",
        });
    }
    Ok(trimmed)
}

/// Return the id for `name`, creating the item if it has never been seen.
///
/// A single upsert statement, so concurrent callers racing on an unseen
/// name converge on the same row.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidName`] for blank names or
/// [`LedgerError::Store`] if the statement fails.
pub fn resolve_or_create(conn: &Connection, name: &str) -> LedgerResult<ItemId> {
    let name = clean_name(name)?;
    let id: i64 = conn.query_row(
        "INSERT INTO items (name, created_at_us) VALUES (?1, ?2)
         ON CONFLICT (name) DO UPDATE SET name = excluded.name
         RETURNING item_id",
        params![name, now_us()],
        |row| row.get(0),
    )?;
    Ok(ItemId(id))
}

/// Look up an item id by exact name without creating anything.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn resolve(conn: &Connection, name: &str) -> LedgerResult<Option<ItemId>> {
    let id = conn
        .query_row(
            "SELECT item_id FROM items WHERE name = ?1",
            params![name.trim()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(ItemId))
}

/// Like [`resolve`], but an unknown name is an error.
///
/// # Errors
///
/// Returns [`LedgerError::UnknownItem`] when the item was never created.
pub fn require(conn: &Connection, name: &str) -> LedgerResult<ItemId> {
    resolve(conn, name)?.ok_or_else(|| LedgerError::UnknownItem {
        name: name.trim().to_string(),
    })
}

/// Item names containing `fragment`, case-insensitively, ordered by name.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn search(conn: &Connection, fragment: &str, limit: u32) -> LedgerResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM items
         WHERE instr(casefold(name), ?1) > 0
         ORDER BY name
         LIMIT ?2",
    )?;
    let names = stmt
        .query_map(params![fold_fragment(fragment), limit], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Like [`search`], restricted to items `actor` currently holds.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn search_held(
    conn: &Connection,
    actor: ActorId,
    fragment: &str,
    limit: u32,
) -> LedgerResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT i.name
         FROM ledger l
         JOIN items i ON i.item_id = l.item_id
         WHERE l.actor_id = ?1 AND instr(casefold(i.name), ?2) > 0
         ORDER BY i.name
         LIMIT ?3",
    )?;
    let names = stmt
        .query_map(params![actor, fold_fragment(fragment), limit], |row| {
            row.get(0)
        })?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn item_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .expect("count items")
    }

    #[test]
    fn resolve_or_create_is_idempotent() {
        let conn = open_in_memory().expect("open store");
        let first = resolve_or_create(&conn, "Scrap").expect("create");
        let second = resolve_or_create(&conn, "Scrap").expect("resolve");
        assert_eq!(first, second);
        assert_eq!(item_count(&conn), 1);
    }

    #[test]
    fn names_are_case_sensitive_keys() {
        let conn = open_in_memory().expect("open store");
        let lower = resolve_or_create(&conn, "scrap").expect("create lower");
        let upper = resolve_or_create(&conn, "Scrap").expect("create upper");
        assert_ne!(lower, upper);
        assert_eq!(item_count(&conn), 2);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let conn = open_in_memory().expect("open store");
        let id = resolve_or_create(&conn, "  Gold ").expect("create");
        assert_eq!(resolve(&conn, "Gold").expect("resolve"), Some(id));
    }

    #[test]
    fn blank_names_are_rejected() {
        let conn = open_in_memory().expect("open store");
        let err = resolve_or_create(&conn, "   ").expect_err("blank name");
        assert!(matches!(err, LedgerError::InvalidName { .. }));
        assert_eq!(item_count(&conn), 0);
    }

    #[test]
    fn resolve_does_not_create() {
        let conn = open_in_memory().expect("open store");
        assert_eq!(resolve(&conn, "Ghost").expect("resolve"), None);
        assert!(matches!(
            require(&conn, "Ghost"),
            Err(LedgerError::UnknownItem { .. })
        ));
        assert_eq!(item_count(&conn), 0);
    }

    #[test]
    fn search_is_case_insensitive_and_capped() {
        let conn = open_in_memory().expect("open store");
        for name in ["Iron Ore", "iron ingot", "Copper", "Ironwood", "Gold"] {
            resolve_or_create(&conn, name).expect("create");
        }

        let hits = search(&conn, "IRON", 25).expect("search");
        assert_eq!(hits, vec!["Iron Ore", "Ironwood", "iron ingot"]);

        let capped = search(&conn, "iron", 2).expect("search");
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let conn = open_in_memory().expect("open store");
        resolve_or_create(&conn, "100% Pure").expect("create");
        resolve_or_create(&conn, "Pure_Water").expect("create");
        resolve_or_create(&conn, "Purest").expect("create");

        assert_eq!(search(&conn, "%", 25).expect("search"), vec!["100% Pure"]);
        assert_eq!(search(&conn, "e_W", 25).expect("search"), vec!["Pure_Water"]);
    }

    #[test]
    fn search_held_only_returns_actor_holdings() {
        let mut conn = open_in_memory().expect("open store");
        resolve_or_create(&conn, "Iron Ore").expect("create");
        crate::ledger::deposit(&mut conn, 1, "Iron Plate", 4).expect("deposit");
        crate::ledger::deposit(&mut conn, 2, "Iron Rod", 9).expect("deposit");

        let held = search_held(&conn, 1, "iron", 25).expect("search held");
        assert_eq!(held, vec!["Iron Plate"]);
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let conn = open_in_memory().expect("open store");
        resolve_or_create(&conn, "Éclat Ore").expect("create");
        resolve_or_create(&conn, "Straße Stone").expect("create");
        resolve_or_create(&conn, "Eclat Dust").expect("create");

        assert_eq!(search(&conn, "éclat", 25).expect("search"), vec!["Éclat Ore"]);
        assert_eq!(search(&conn, "ÉCLAT ORE", 25).expect("search"), vec!["Éclat Ore"]);
        assert_eq!(search(&conn, "STRAßE", 25).expect("search"), vec!["Straße Stone"]);
    }

    #[test]
    fn empty_fragment_lists_everything() {
        let conn = open_in_memory().expect("open store");
        for name in ["Copper", "Gold"] {
            resolve_or_create(&conn, name).expect("create");
        }
        assert_eq!(search(&conn, "  ", 25).expect("search"), vec!["Copper", "Gold"]);
    }
}
