//! Actor identity resolution for CLI commands.
//!
//! The resolution chain: `--actor` flag > `STOCKPILE_ACTOR` env > `actor` in
//! the user config. Commands that touch one actor's ledger require an
//! identity; pooled reads work without one.

use std::env;

use stockpile_core::ActorId;

use crate::output::CliError;

const ACTOR_ENV: &str = "STOCKPILE_ACTOR";

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

fn resolve_actor_with(
    cli_flag: Option<ActorId>,
    configured: Option<ActorId>,
    env: &dyn EnvReader,
) -> Result<Option<ActorId>, CliError> {
    if let Some(actor) = cli_flag {
        return Ok(Some(actor));
    }

    if let Some(raw) = env.get(ACTOR_ENV) {
        return raw.trim().parse::<ActorId>().map(Some).map_err(|_| {
            CliError::with_details(
                format!("{ACTOR_ENV}={raw} is not a numeric actor id"),
                format!("Export a whole number, e.g. {ACTOR_ENV}=1001."),
                "invalid_actor",
            )
        });
    }

    Ok(configured)
}

/// Resolve the actor identity, returning an error if none is available.
pub fn require_actor(
    cli_flag: Option<ActorId>,
    configured: Option<ActorId>,
) -> Result<ActorId, CliError> {
    resolve_actor_with(cli_flag, configured, &RealEnv)?.ok_or_else(|| {
        CliError::with_details(
            "Actor identity required for this command.",
            format!("Pass --actor <id>, set {ACTOR_ENV}, or add `actor = <id>` to the user config."),
            "missing_actor",
        )
    })
}
