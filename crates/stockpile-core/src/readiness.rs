//! Project readiness: how close the pooled stock is to a project's targets.
//!
//! For every requirement the calculator counts what is held directly and
//! what could still be crafted through the item's recipe. Raw material that
//! the project needs on its own account is reserved first, so it is never
//! counted both toward its own target and as crafting feedstock.
//!
//! Reservation only looks one level deep: if two crafted requirements share
//! a raw input, each sees the full surplus of that input. Recipes are never
//! chained.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::LedgerResult;
use crate::ledger;
use crate::project::{self, Requirement};
use crate::recipe::{self, Recipe};

/// Crafting contribution to one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CraftSource {
    pub input: String,
    pub ratio: i64,
    /// Input held beyond what the project reserves for itself.
    pub surplus: i64,
}

/// Status of one required item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReadiness {
    pub item: String,
    pub target: i64,
    pub direct: i64,
    pub potential: i64,
    pub ready: i64,
    pub percent_complete: u8,
    /// Complete sets this item alone could cover; `None` for a zero target.
    pub sets: Option<i64>,
    pub craft: Option<CraftSource>,
}

impl ItemReadiness {
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.ready >= self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub project: String,
    pub items: Vec<ItemReadiness>,
    /// Bottleneck across constraining requirements; `None` when every target
    /// is zero.
    pub available_sets: Option<i64>,
}

impl ReadinessReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(ItemReadiness::is_satisfied)
    }
}

/// Compute the readiness report for `requirements`.
///
/// `global_total` returns the pooled quantity of an item (zero when nobody
/// holds it) and `recipe_for` the recipe producing an item. Both are
/// consulted per requirement; nothing is written.
///
/// Returns `Ok(None)` when the project has no requirements at all.
///
/// # Errors
///
/// Propagates the first error returned by either lookup.
pub fn compute<E, G, R>(
    project: &str,
    requirements: &[Requirement],
    mut global_total: G,
    mut recipe_for: R,
) -> Result<Option<ReadinessReport>, E>
where
    G: FnMut(&str) -> Result<i64, E>,
    R: FnMut(&str) -> Result<Option<Recipe>, E>,
{
    if requirements.is_empty() {
        return Ok(None);
    }

    let reserved: HashMap<&str, i64> = requirements
        .iter()
        .map(|req| (req.item.as_str(), req.target))
        .collect();

    let mut items = Vec::with_capacity(requirements.len());
    for req in requirements {
        let direct = global_total(&req.item)?;

        let craft = match recipe_for(&req.item)? {
            Some(recipe) => {
                let raw_total = global_total(&recipe.input)?;
                let raw_reserved = reserved.get(recipe.input.as_str()).copied().unwrap_or(0);
                Some(CraftSource {
                    surplus: raw_total.saturating_sub(raw_reserved).max(0),
                    input: recipe.input,
                    ratio: recipe.ratio,
                })
            }
            None => None,
        };
        let potential = craft
            .as_ref()
            .map_or(0, |source| source.surplus / source.ratio);

        let ready = direct.saturating_add(potential);
        items.push(ItemReadiness {
            item: req.item.clone(),
            target: req.target,
            direct,
            potential,
            ready,
            percent_complete: percent_complete(ready, req.target),
            sets: (req.target > 0).then(|| ready / req.target),
            craft,
        });
    }

    let available_sets = items.iter().filter_map(|item| item.sets).min();

    Ok(Some(ReadinessReport {
        project: project.to_string(),
        items,
        available_sets,
    }))
}

/// Readiness of a stored project, read from the ledger and recipe table.
///
/// The reads are independent, so a report taken while stock moves may mix
/// totals from slightly different moments.
///
/// # Errors
///
/// Returns [`crate::LedgerError::UnknownProject`] when the project does not
/// exist, or [`crate::LedgerError::Store`] if a read fails.
pub fn project_status(conn: &Connection, name: &str) -> LedgerResult<Option<ReadinessReport>> {
    let requirements = project::requirements(conn, name)?;
    compute(
        name.trim(),
        &requirements,
        |item| ledger::global_total(conn, item),
        |item| recipe::lookup(conn, item),
    )
}

fn percent_complete(ready: i64, target: i64) -> u8 {
    if target <= 0 {
        return 100;
    }
    let percent = (i128::from(ready.max(0)) * 100 / i128::from(target)).min(100);
    u8::try_from(percent).unwrap_or(100)
}
