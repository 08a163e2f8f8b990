//! Single-step conversion recipes: `ratio` units of input make one output.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger;
use crate::model::ActorId;
use crate::registry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub output: String,
    pub input: String,
    pub ratio: i64,
}

/// An actor who could craft the output from what they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Producer {
    pub actor: ActorId,
    pub quantity: i64,
    pub can_make: i64,
}

/// A recipe together with the holders able to run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionChain {
    pub recipe: Recipe,
    pub producers: Vec<Producer>,
}

/// Define (or redefine) how `output` is made. Redefinition replaces the
/// previous recipe for `output`.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRecipe`] when `ratio <= 0` or both names
/// refer to the same item, [`LedgerError::InvalidName`] for blank names, or
/// [`LedgerError::Store`].
pub fn define(conn: &mut Connection, output: &str, input: &str, ratio: i64) -> LedgerResult<Recipe> {
    let output = registry::clean_name(output)?;
    let input = registry::clean_name(input)?;
    if ratio <= 0 {
        return Err(LedgerError::InvalidRecipe {
            output: output.to_string(),
            reason: "ratio must be positive",
        });
    }
    if output == input {
        return Err(LedgerError::InvalidRecipe {
            output: output.to_string(),
            reason: "an item cannot be made from itself",
        });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let output_id = registry::resolve_or_create(&tx, output)?;
    let input_id = registry::resolve_or_create(&tx, input)?;
    tx.execute(
        "INSERT INTO recipes (output_item_id, input_item_id, ratio)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (output_item_id) DO UPDATE SET
             input_item_id = excluded.input_item_id,
             ratio = excluded.ratio",
        params![output_id.0, input_id.0, ratio],
    )?;
    tx.commit()?;

    debug!(output, input, ratio, "recipe defined");
    Ok(Recipe {
        output: output.to_string(),
        input: input.to_string(),
        ratio,
    })
}

/// The recipe producing `output`, if one is defined.
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if the query fails.
pub fn lookup(conn: &Connection, output: &str) -> LedgerResult<Option<Recipe>> {
    let recipe = conn
        .query_row(
            "SELECT o.name, i.name, r.ratio
             FROM recipes r
             JOIN items o ON o.item_id = r.output_item_id
             JOIN items i ON i.item_id = r.input_item_id
             WHERE o.name = ?1",
            params![output.trim()],
            |row| {
                Ok(Recipe {
                    output: row.get(0)?,
                    input: row.get(1)?,
                    ratio: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(recipe)
}

/// The recipe for `output` plus up to `limit` holders of its input who hold
/// at least one batch worth (`ratio` units).
///
/// # Errors
///
/// Returns [`LedgerError::Store`] if a query fails.
pub fn production(
    conn: &Connection,
    output: &str,
    limit: u32,
) -> LedgerResult<Option<ProductionChain>> {
    let Some(recipe) = lookup(conn, output)? else {
        return Ok(None);
    };

    let producers = ledger::top_holders(conn, &recipe.input, limit)?
        .into_iter()
        .filter(|holder| holder.quantity >= recipe.ratio)
        .map(|holder| Producer {
            actor: holder.actor,
            quantity: holder.quantity,
            can_make: holder.quantity / recipe.ratio,
        })
        .collect();

    Ok(Some(ProductionChain { recipe, producers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn define_creates_both_items() {
        let mut conn = open_in_memory().expect("open store");
        define(&mut conn, "Widget", "Scrap", 10).expect("define");

        assert!(registry::resolve(&conn, "Widget").expect("resolve").is_some());
        assert!(registry::resolve(&conn, "Scrap").expect("resolve").is_some());
        assert_eq!(
            lookup(&conn, "Widget").expect("lookup"),
            Some(Recipe {
                output: "Widget".to_string(),
                input: "Scrap".to_string(),
                ratio: 10
            })
        );
    }

    #[test]
    fn redefinition_is_last_write_wins() {
        let mut conn = open_in_memory().expect("open store");
        define(&mut conn, "Widget", "Scrap", 10).expect("define");
        define(&mut conn, "Widget", "Copper", 3).expect("redefine");

        let recipe = lookup(&conn, "Widget").expect("lookup").expect("recipe");
        assert_eq!(recipe.input, "Copper");
        assert_eq!(recipe.ratio, 3);
    }

    #[test]
    fn rejects_bad_ratio_and_self_reference() {
        let mut conn = open_in_memory().expect("open store");
        for ratio in [0, -2] {
            let err = define(&mut conn, "Widget", "Scrap", ratio).expect_err("bad ratio");
            assert!(matches!(err, LedgerError::InvalidRecipe { .. }));
        }
        let err = define(&mut conn, "Widget", " Widget ", 2).expect_err("self recipe");
        assert!(matches!(err, LedgerError::InvalidRecipe { .. }));
        assert!(registry::resolve(&conn, "Widget").expect("resolve").is_none());
    }

    #[test]
    fn lookup_without_recipe_is_none() {
        let conn = open_in_memory().expect("open store");
        assert_eq!(lookup(&conn, "Widget").expect("lookup"), None);
    }

    #[test]
    fn production_lists_holders_with_a_full_batch() {
        let mut conn = open_in_memory().expect("open store");
        define(&mut conn, "Widget", "Scrap", 10).expect("define");
        ledger::deposit(&mut conn, 1, "Scrap", 35).expect("deposit");
        ledger::deposit(&mut conn, 2, "Scrap", 9).expect("deposit");
        ledger::deposit(&mut conn, 3, "Scrap", 120).expect("deposit");

        let chain = production(&conn, "Widget", 10)
            .expect("production")
            .expect("chain");
        let producers: Vec<_> = chain
            .producers
            .iter()
            .map(|p| (p.actor, p.can_make))
            .collect();
        assert_eq!(producers, vec![(3, 12), (1, 3)]);
    }

    #[test]
    fn production_without_recipe_is_none() {
        let conn = open_in_memory().expect("open store");
        assert!(production(&conn, "Widget", 10).expect("production").is_none());
    }
}
