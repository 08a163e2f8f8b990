//! `sp dashboard set|show`: per-guild live status bindings.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use stockpile_core::project::{self, DashboardBinding};
use stockpile_core::{GuildId, readiness};

use crate::cmd::status::{StatusOutput, render_status};
use crate::context::Ctx;
use crate::output::{CliError, pretty_kv, render};

#[derive(Args, Debug)]
pub struct DashboardArgs {
    #[command(subcommand)]
    pub command: DashboardCommand,
}

#[derive(Subcommand, Debug)]
pub enum DashboardCommand {
    #[command(about = "Bind a guild's status message to a project")]
    Set {
        /// Guild id.
        guild: GuildId,
        /// Channel id holding the status message.
        channel: i64,
        /// Message id to keep updated.
        message: i64,
        /// Project the message tracks.
        project: String,
    },

    #[command(about = "Show a guild's binding and its current project status")]
    Show {
        /// Guild id.
        guild: GuildId,
    },
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    binding: DashboardBinding,
    status: StatusOutput,
}

pub fn run_dashboard(args: &DashboardArgs, ctx: &Ctx) -> Result<()> {
    match &args.command {
        DashboardCommand::Set {
            guild,
            channel,
            message,
            project: name,
        } => {
            let conn = ctx.connect()?;
            let binding = project::bind_dashboard(&conn, *guild, *channel, *message, name)?;
            render(ctx.output(), &binding, |value, w| {
                writeln!(
                    w,
                    "✓ Guild {} dashboard now tracks {}",
                    value.guild, value.project
                )
            })
        }
        DashboardCommand::Show { guild } => {
            let conn = ctx.connect()?;
            let Some(binding) = project::dashboard(&conn, *guild)? else {
                return Err(CliError::with_details(
                    format!("guild {guild} has no dashboard"),
                    "Bind one with `sp dashboard set <guild> <channel> <message> <project>`.",
                    "no_dashboard",
                )
                .into());
            };

            let status = StatusOutput {
                project: binding.project.clone(),
                report: readiness::project_status(&conn, &binding.project)?,
            };

            if ctx.output().is_json() {
                return render(ctx.output(), &ShowOutput { binding, status }, |_, _| Ok(()));
            }

            render(ctx.output(), &binding, |value, w| {
                pretty_kv(w, "Guild", value.guild.to_string())?;
                pretty_kv(w, "Channel", value.channel.to_string())?;
                pretty_kv(w, "Message", value.message.to_string())?;
                writeln!(w)
            })?;
            render_status(ctx, &status)
        }
    }
}
