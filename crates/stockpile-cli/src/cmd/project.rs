//! `sp project` namespace: create projects and manage their requirements.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use stockpile_core::project::{self, Requirement};
use stockpile_core::sheet::{SheetOutcome, StockSheet};

use crate::cmd::stock::{load_sheet, write_sheet_outcome};
use crate::context::Ctx;
use crate::output::{render, thousands};

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    #[command(about = "Create a new project")]
    Create {
        /// Unique project name.
        name: String,
    },

    #[command(about = "List projects, optionally filtered by name")]
    List {
        /// Case-insensitive name fragment.
        #[arg(default_value = "")]
        fragment: String,

        /// Maximum names to list.
        #[arg(long, short)]
        limit: Option<u32>,
    },

    #[command(about = "Set how much of an item a project needs")]
    Require {
        /// Project name.
        project: String,
        /// Item name (created if new).
        item: String,
        /// Target amount; 0 keeps the item listed without constraining.
        #[arg(allow_negative_numbers = true)]
        target: i64,
    },

    #[command(about = "Show a project's requirements")]
    Requirements {
        /// Project name.
        project: String,

        /// Print an `Item: Qty` sheet that `sp project import` accepts.
        #[arg(long)]
        export: bool,
    },

    #[command(about = "Set many requirements from an `Item: Qty` sheet")]
    Import {
        /// Project name.
        project: String,
        /// Sheet file; `-` reads stdin.
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct CreateOutput<'a> {
    project: &'a str,
    id: i64,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    projects: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RequireOutput<'a> {
    project: &'a str,
    item: &'a str,
    target: i64,
}

#[derive(Debug, Serialize)]
struct RequirementsOutput<'a> {
    project: &'a str,
    requirements: Vec<Requirement>,
}

#[derive(Debug, Serialize)]
struct ImportOutput<'a> {
    project: &'a str,
    #[serde(flatten)]
    outcome: SheetOutcome,
}

pub fn run_project(args: &ProjectArgs, ctx: &Ctx) -> Result<()> {
    match &args.command {
        ProjectCommand::Create { name } => {
            let conn = ctx.connect()?;
            let id = project::create(&conn, name)?;
            let payload = CreateOutput {
                project: name.trim(),
                id: id.0,
            };
            render(ctx.output(), &payload, |value, w| {
                writeln!(w, "✓ Created project {}", value.project)
            })
        }
        ProjectCommand::List { fragment, limit } => {
            let conn = ctx.connect()?;
            let limit = limit.unwrap_or_else(|| ctx.search_limit());
            let projects = project::search(&conn, fragment, limit)?;
            render(ctx.output(), &ListOutput { projects }, |value, w| {
                if value.projects.is_empty() {
                    return writeln!(w, "(no projects)");
                }
                for name in &value.projects {
                    writeln!(w, "{name}")?;
                }
                Ok(())
            })
        }
        ProjectCommand::Require {
            project: name,
            item,
            target,
        } => {
            let mut conn = ctx.connect()?;
            project::add_requirement(&mut conn, name, item, *target)?;
            let payload = RequireOutput {
                project: name.trim(),
                item: item.trim(),
                target: *target,
            };
            render(ctx.output(), &payload, |value, w| {
                writeln!(
                    w,
                    "✓ {} now needs {} {}",
                    value.project,
                    thousands(value.target),
                    value.item
                )
            })
        }
        ProjectCommand::Requirements {
            project: name,
            export,
        } => {
            let conn = ctx.connect()?;
            let requirements = project::requirements(&conn, name)?;
            if *export {
                let sheet = StockSheet::from_entries(
                    requirements.into_iter().map(|req| (req.item, req.target)),
                );
                print!("{}", sheet.render());
                return Ok(());
            }

            let payload = RequirementsOutput {
                project: name.trim(),
                requirements,
            };
            render(ctx.output(), &payload, |value, w| {
                if value.requirements.is_empty() {
                    return writeln!(w, "{} has no requirements yet.", value.project);
                }
                writeln!(w, "{:<32} {:>12}", "ITEM", "TARGET")?;
                writeln!(w, "{}", "-".repeat(45))?;
                for req in &value.requirements {
                    writeln!(w, "{:<32} {:>12}", req.item, thousands(req.target))?;
                }
                Ok(())
            })
        }
        ProjectCommand::Import {
            project: name,
            file,
        } => {
            let sheet = load_sheet(file)?;
            let mut conn = ctx.connect()?;
            let outcome = project::apply_requirement_sheet(&mut conn, name, &sheet)?;
            let payload = ImportOutput {
                project: name.trim(),
                outcome,
            };
            render(ctx.output(), &payload, |value, w| {
                write_sheet_outcome(w, &value.outcome)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ProjectArgs,
    }

    #[test]
    fn require_parses_positionals() {
        let w = Wrapper::parse_from(["test", "require", "Bunker", "Scrap", "1000"]);
        match w.args.command {
            ProjectCommand::Require {
                project,
                item,
                target,
            } => {
                assert_eq!(project, "Bunker");
                assert_eq!(item, "Scrap");
                assert_eq!(target, 1000);
            }
            other => panic!("expected require, got {other:?}"),
        }
    }

    #[test]
    fn list_fragment_defaults_to_everything() {
        let w = Wrapper::parse_from(["test", "list"]);
        assert!(matches!(
            w.args.command,
            ProjectCommand::List { ref fragment, limit: None } if fragment.is_empty()
        ));
    }
}
