//! Pooled read commands: `sp total`, `sp locate`, `sp items`.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use stockpile_core::ledger::{self, HolderRow};
use stockpile_core::registry;

use crate::context::Ctx;
use crate::output::{render, thousands};

#[derive(Args, Debug)]
pub struct TotalArgs {
    /// Item name.
    pub item: String,
}

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Item name.
    pub item: String,

    /// Maximum holders to list (default from `[lookup] holders_limit`).
    #[arg(long, short)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub struct ItemsArgs {
    /// Case-insensitive name fragment.
    #[arg(default_value = "")]
    pub fragment: String,

    /// Only items the current actor holds.
    #[arg(long)]
    pub held: bool,

    /// Maximum names to list (default from `[lookup] search_limit`).
    #[arg(long, short)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct TotalOutput<'a> {
    item: &'a str,
    total: i64,
}

#[derive(Debug, Serialize)]
struct LocateOutput<'a> {
    item: &'a str,
    total: i64,
    holders: Vec<HolderRow>,
}

#[derive(Debug, Serialize)]
struct ItemsOutput {
    items: Vec<String>,
}

pub fn run_total(args: &TotalArgs, ctx: &Ctx) -> Result<()> {
    let conn = ctx.connect()?;
    let total = ledger::global_total(&conn, &args.item)?;

    let payload = TotalOutput {
        item: args.item.trim(),
        total,
    };
    render(ctx.output(), &payload, |value, w| {
        writeln!(w, "{}: {}", value.item, thousands(value.total))
    })
}

pub fn run_locate(args: &LocateArgs, ctx: &Ctx) -> Result<()> {
    let conn = ctx.connect()?;
    let limit = args.limit.unwrap_or_else(|| ctx.holders_limit());
    let holders = ledger::top_holders(&conn, &args.item, limit)?;
    let total = ledger::global_total(&conn, &args.item)?;

    let payload = LocateOutput {
        item: args.item.trim(),
        total,
        holders,
    };
    render(ctx.output(), &payload, |value, w| {
        if value.holders.is_empty() {
            return writeln!(w, "Nobody holds {}.", value.item);
        }
        writeln!(w, "{} (pool total {})", value.item, thousands(value.total))?;
        for (rank, holder) in value.holders.iter().enumerate() {
            writeln!(
                w,
                "  {:>2}. actor {:<20} {:>12}",
                rank + 1,
                holder.actor,
                thousands(holder.quantity)
            )?;
        }
        Ok(())
    })
}

pub fn run_items(args: &ItemsArgs, ctx: &Ctx) -> Result<()> {
    let conn = ctx.connect()?;
    let limit = args.limit.unwrap_or_else(|| ctx.search_limit());
    let items = if args.held {
        registry::search_held(&conn, ctx.actor()?, &args.fragment, limit)?
    } else {
        registry::search(&conn, &args.fragment, limit)?
    };

    render(ctx.output(), &ItemsOutput { items }, |value, w| {
        if value.items.is_empty() {
            return writeln!(w, "(no matching items)");
        }
        for item in &value.items {
            writeln!(w, "{item}")?;
        }
        Ok(())
    })
}
