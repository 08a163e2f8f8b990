//! `sp deposit`, `sp withdraw`, `sp set`, `sp stock` and `sp import`:
//! commands that read or change the calling actor's own ledger.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use stockpile_core::ledger::{self, Holding, SheetMode};
use stockpile_core::sheet::{SheetOutcome, StockSheet};
use stockpile_core::ActorId;

use crate::context::Ctx;
use crate::output::{CliError, render, thousands};

#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Item name (created if new).
    pub item: String,

    /// Amount to add; must be positive.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Item name.
    pub item: String,

    /// Amount to remove; must be positive and no more than you hold.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Item name.
    pub item: String,

    /// New exact quantity; 0 clears the entry.
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,
}

#[derive(Args, Debug, Default)]
pub struct StockArgs {
    /// Print an `Item: Qty` sheet that `sp import` accepts.
    #[arg(long)]
    pub export: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Sheet file with one `Item: Qty` per line; `-` reads stdin.
    pub file: PathBuf,

    /// Replace balances instead of adding to them.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
struct DepositOutput<'a> {
    actor: ActorId,
    item: &'a str,
    deposited: i64,
    balance: i64,
}

#[derive(Debug, Serialize)]
struct WithdrawOutput<'a> {
    actor: ActorId,
    item: &'a str,
    withdrawn: i64,
    remaining: i64,
    global_total: i64,
}

#[derive(Debug, Serialize)]
struct SetOutput<'a> {
    actor: ActorId,
    item: &'a str,
    previous: i64,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct StockOutput {
    actor: ActorId,
    holdings: Vec<Holding>,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    actor: ActorId,
    mode: &'static str,
    #[serde(flatten)]
    outcome: SheetOutcome,
}

pub fn run_deposit(args: &DepositArgs, ctx: &Ctx) -> Result<()> {
    let actor = ctx.actor()?;
    let mut conn = ctx.connect()?;
    let balance = ledger::deposit(&mut conn, actor, &args.item, args.amount)?;

    let payload = DepositOutput {
        actor,
        item: args.item.trim(),
        deposited: args.amount,
        balance,
    };
    render(ctx.output(), &payload, |value, w| {
        writeln!(
            w,
            "✓ Deposited {} {} (you now hold {})",
            thousands(value.deposited),
            value.item,
            thousands(value.balance)
        )
    })
}

pub fn run_withdraw(args: &WithdrawArgs, ctx: &Ctx) -> Result<()> {
    let actor = ctx.actor()?;
    let mut conn = ctx.connect()?;
    let outcome = ledger::withdraw(&mut conn, actor, &args.item, args.amount)?;

    let payload = WithdrawOutput {
        actor,
        item: args.item.trim(),
        withdrawn: args.amount,
        remaining: outcome.remaining,
        global_total: outcome.global_total,
    };
    render(ctx.output(), &payload, |value, w| {
        writeln!(
            w,
            "✓ Withdrew {} {} (you hold {}, pool holds {})",
            thousands(value.withdrawn),
            value.item,
            thousands(value.remaining),
            thousands(value.global_total)
        )
    })
}

pub fn run_set(args: &SetArgs, ctx: &Ctx) -> Result<()> {
    let actor = ctx.actor()?;
    let mut conn = ctx.connect()?;
    let outcome = ledger::set_exact(&mut conn, actor, &args.item, args.quantity)?;

    let payload = SetOutput {
        actor,
        item: args.item.trim(),
        previous: outcome.previous,
        quantity: outcome.quantity,
    };
    render(ctx.output(), &payload, |value, w| {
        writeln!(
            w,
            "✓ {} set to {} (was {})",
            value.item,
            thousands(value.quantity),
            thousands(value.previous)
        )
    })
}

pub fn run_stock(args: &StockArgs, ctx: &Ctx) -> Result<()> {
    let actor = ctx.actor()?;
    let conn = ctx.connect()?;
    let holdings = ledger::total_for(&conn, actor)?;

    if args.export {
        let sheet = StockSheet::from_entries(
            holdings
                .into_iter()
                .map(|holding| (holding.item, holding.quantity)),
        );
        print!("{}", sheet.render());
        return Ok(());
    }

    let payload = StockOutput { actor, holdings };
    render(ctx.output(), &payload, |value, w| {
        if value.holdings.is_empty() {
            return writeln!(w, "(nothing held by actor {})", value.actor);
        }
        writeln!(w, "{:<32} {:>12}", "ITEM", "QUANTITY")?;
        writeln!(w, "{}", "-".repeat(45))?;
        for holding in &value.holdings {
            writeln!(w, "{:<32} {:>12}", holding.item, thousands(holding.quantity))?;
        }
        Ok(())
    })
}

pub fn run_import(args: &ImportArgs, ctx: &Ctx) -> Result<()> {
    let actor = ctx.actor()?;
    let sheet = load_sheet(&args.file)?;
    let mode = if args.overwrite {
        SheetMode::Overwrite
    } else {
        SheetMode::Add
    };

    let mut conn = ctx.connect()?;
    let outcome = ledger::apply_sheet(&mut conn, actor, &sheet, mode)?;

    let payload = ImportOutput {
        actor,
        mode: if args.overwrite { "overwrite" } else { "add" },
        outcome,
    };
    render(ctx.output(), &payload, |value, w| write_sheet_outcome(w, &value.outcome))
}

/// Read and parse a sheet from a file, or from stdin when the path is `-`.
///
/// A sheet with no `Item: Qty` lines at all is refused.
pub fn load_sheet(path: &std::path::Path) -> Result<StockSheet> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read sheet from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    let sheet = StockSheet::parse(&text);
    if sheet.is_empty() && sheet.rejected().is_empty() {
        return Err(CliError::with_details(
            format!("{} has no `Item: Qty` lines", path.display()),
            "Write one `Item: Qty` per line, e.g. `Scrap: 500`.",
            "empty_sheet",
        )
        .into());
    }
    Ok(sheet)
}

pub fn write_sheet_outcome(w: &mut dyn std::io::Write, outcome: &SheetOutcome) -> std::io::Result<()> {
    writeln!(w, "✓ Applied {} line(s)", outcome.applied)?;
    if !outcome.failures.is_empty() {
        writeln!(w, "  {} line(s) skipped:", outcome.failures.len())?;
        for failure in &outcome.failures {
            writeln!(w, "    line {}: {} ({})", failure.line, failure.text, failure.reason)?;
        }
    }
    Ok(())
}
