//! `sp status`: project readiness with progress bars.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

use stockpile_core::readiness::{self, ItemReadiness, ReadinessReport};

use crate::context::Ctx;
use crate::output::{pretty_kv, pretty_section, render_mode, thousands};

const DIRECT_CELL: char = '▓';
const CRAFT_CELL: char = '▒';
const EMPTY_CELL: char = '░';

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project name.
    pub project: String,
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub project: String,
    /// `None` when the project has no requirements yet.
    pub report: Option<ReadinessReport>,
}

pub fn run_status(args: &StatusArgs, ctx: &Ctx) -> Result<()> {
    let conn = ctx.connect()?;
    let report = readiness::project_status(&conn, &args.project)?;
    let payload = StatusOutput {
        project: args.project.trim().to_string(),
        report,
    };
    render_status(ctx, &payload)
}

pub fn render_status(ctx: &Ctx, payload: &StatusOutput) -> Result<()> {
    let width = ctx.config().project.dashboard.bar_width;
    render_mode(
        ctx.output(),
        payload,
        |value, w| write_text(w, value),
        |value, w| write_pretty(w, value, width),
    )
}

/// Tab-separated rows: item, target, direct, potential, ready, percent, sets.
fn write_text(w: &mut dyn Write, value: &StatusOutput) -> io::Result<()> {
    let Some(report) = &value.report else {
        return writeln!(w, "{}\tno requirements", value.project);
    };
    for item in &report.items {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            item.item,
            item.target,
            item.direct,
            item.potential,
            item.ready,
            item.percent_complete,
            item.sets.map_or_else(|| "-".to_string(), |sets| sets.to_string())
        )?;
    }
    match report.available_sets {
        Some(sets) => writeln!(w, "available_sets\t{sets}"),
        None => writeln!(w, "available_sets\t-"),
    }
}

fn write_pretty(w: &mut dyn Write, value: &StatusOutput, width: usize) -> io::Result<()> {
    pretty_section(w, &format!("Project Status: {}", value.project))?;
    let Some(report) = &value.report else {
        return writeln!(w, "No requirements yet. Add some with `sp project require`.");
    };

    match report.available_sets {
        Some(sets) => pretty_kv(w, "Available sets", format!("{} completions available", thousands(sets)))?,
        None => pretty_kv(w, "Available sets", "no constraining requirements")?,
    }
    if report.is_complete() {
        writeln!(w, "✓ Every target is covered")?;
    }
    writeln!(w)?;

    for item in &report.items {
        write_item(w, item, width)?;
    }
    writeln!(w, "{DIRECT_CELL} = ready, {CRAFT_CELL} = craftable")
}

fn write_item(w: &mut dyn Write, item: &ItemReadiness, width: usize) -> io::Result<()> {
    writeln!(w, "{}", item.item)?;
    writeln!(
        w,
        "  {} {:>3}%",
        progress_bar(item.direct, item.potential, item.target, width),
        item.percent_complete
    )?;
    writeln!(
        w,
        "  Ready: {} / {}",
        thousands(item.direct),
        thousands(item.target)
    )?;
    if let Some(craft) = &item.craft {
        if item.potential > 0 {
            writeln!(
                w,
                "  Potential: +{} (from {} excess {})",
                thousands(item.potential),
                thousands(craft.surplus),
                craft.input
            )?;
        } else {
            writeln!(w, "  No spare {} to craft from", craft.input)?;
        }
    }
    writeln!(w)
}

/// Bar of `width` cells: held stock, then craftable stock, then the gap.
pub fn progress_bar(direct: i64, potential: i64, target: i64, width: usize) -> String {
    let (direct_cells, craft_cells) = if target <= 0 {
        (width, 0)
    } else {
        let direct_cells = cells(direct, target, width);
        let craft_cells = cells(potential, target, width).min(width - direct_cells);
        (direct_cells, craft_cells)
    };

    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat_n(DIRECT_CELL, direct_cells));
    bar.extend(std::iter::repeat_n(CRAFT_CELL, craft_cells));
    bar.extend(std::iter::repeat_n(EMPTY_CELL, width - direct_cells - craft_cells));
    bar
}

fn cells(amount: i64, target: i64, width: usize) -> usize {
    let width_i = i128::try_from(width).unwrap_or(i128::MAX);
    let scaled = (i128::from(amount.max(0)) * width_i / i128::from(target)).min(width_i);
    usize::try_from(scaled).unwrap_or(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_splits_direct_and_craftable() {
        assert_eq!(progress_bar(50, 25, 100, 12), "▓▓▓▓▓▓▒▒▒░░░");
    }

    #[test]
    fn bar_never_overflows_width() {
        let bar = progress_bar(90, 500, 100, 12);
        assert_eq!(bar.chars().count(), 12);
        assert_eq!(bar.chars().filter(|c| *c == '▒').count(), 2);

        assert_eq!(progress_bar(1_000, 0, 10, 4), "▓▓▓▓");
    }

    #[test]
    fn zero_target_bar_is_full() {
        assert_eq!(progress_bar(0, 0, 0, 5), "▓▓▓▓▓");
    }

    #[test]
    fn empty_bar_for_nothing_held() {
        assert_eq!(progress_bar(0, 0, 100, 3), "░░░");
    }
}
