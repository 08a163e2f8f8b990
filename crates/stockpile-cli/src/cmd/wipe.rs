//! `sp wipe`: delete every ledger entry behind a typed confirmation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use stockpile_core::ledger;

use crate::context::Ctx;
use crate::output::{CliError, render};

/// Phrase that must be passed to `--confirm` verbatim.
pub const CONFIRM_PHRASE: &str = "DELETE EVERYTHING";

#[derive(Args, Debug)]
pub struct WipeArgs {
    /// Type `DELETE EVERYTHING` to confirm.
    #[arg(long)]
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
struct WipeOutput {
    removed: usize,
}

/// Execute `sp wipe`: delete every ledger entry for every actor.
///
/// Items, recipes, projects and dashboards are kept.
///
/// # Errors
///
/// Returns an error without touching the store unless the confirmation
/// phrase matches exactly.
pub fn run_wipe(args: &WipeArgs, ctx: &Ctx) -> Result<()> {
    if args.confirm.as_deref() != Some(CONFIRM_PHRASE) {
        return Err(CliError::with_details(
            "wipe not confirmed; nothing was deleted",
            format!("Re-run with --confirm \"{CONFIRM_PHRASE}\"."),
            "unconfirmed",
        )
        .into());
    }

    let conn = ctx.connect()?;
    let removed = ledger::wipe_all(&conn)?;
    render(ctx.output(), &WipeOutput { removed }, |value, w| {
        writeln!(w, "✓ Wiped ledger ({} entries removed)", value.removed)
    })
}
