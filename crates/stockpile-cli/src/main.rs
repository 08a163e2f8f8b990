#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use stockpile_core::{ActorId, ErrorCode, config};

use context::Ctx;
use output::{CliError, OutputMode, render_error};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sp: shared inventory ledger and project readiness",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Act as this actor id (overrides STOCKPILE_ACTOR and user config).
    #[arg(long, global = true, allow_negative_numbers = true)]
    actor: Option<ActorId>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode requested on the command line, if any.
    fn flag_output(&self) -> Option<OutputMode> {
        if self.json {
            Some(OutputMode::Json)
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create or migrate the stockpile store",
        long_about = "Create .stockpile/ with a default config and a migrated SQLite database.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    sp init\n\n    # Reset the config file to defaults\n    sp init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Ledger",
        about = "Add items to your stock",
        long_about = "Add a positive amount of an item to the current actor's stock, creating the item if new.",
        after_help = "EXAMPLES:\n    # Deposit 500 scrap\n    sp deposit Scrap 500\n\n    # As a specific actor, with JSON output\n    sp --actor 1001 deposit \"Iron Plate\" 40 --json"
    )]
    Deposit(cmd::stock::DepositArgs),

    #[command(
        next_help_heading = "Ledger",
        about = "Take items out of your stock",
        long_about = "Remove an amount of an item from the current actor's stock. Over-withdrawal is refused and nothing changes.",
        after_help = "EXAMPLES:\n    # Withdraw 120 scrap\n    sp withdraw Scrap 120"
    )]
    Withdraw(cmd::stock::WithdrawArgs),

    #[command(
        next_help_heading = "Ledger",
        about = "Overwrite your stock of one item",
        long_about = "Set the current actor's stock of an item to an exact quantity. Zero clears the entry.",
        after_help = "EXAMPLES:\n    # Correct a miscount\n    sp set Scrap 480\n\n    # Clear an entry\n    sp set Scrap 0"
    )]
    Set(cmd::stock::SetArgs),

    #[command(
        next_help_heading = "Ledger",
        about = "List your stock",
        long_about = "List everything the current actor holds, ordered by item name.",
        after_help = "EXAMPLES:\n    # Show your stock\n    sp stock\n\n    # Save it as an editable sheet\n    sp stock --export > mine.txt"
    )]
    Stock(cmd::stock::StockArgs),

    #[command(
        next_help_heading = "Ledger",
        about = "Apply an `Item: Qty` sheet to your stock",
        long_about = "Read one `Item: Qty` per line and deposit each amount, or overwrite balances with --overwrite.",
        after_help = "EXAMPLES:\n    # Add everything in a sheet\n    sp import haul.txt\n\n    # Replace balances from an edited export\n    sp import mine.txt --overwrite"
    )]
    Import(cmd::stock::ImportArgs),

    #[command(
        next_help_heading = "Lookup",
        about = "Pooled total of an item",
        after_help = "EXAMPLES:\n    sp total Scrap"
    )]
    Total(cmd::lookup::TotalArgs),

    #[command(
        next_help_heading = "Lookup",
        about = "Who holds an item",
        long_about = "List the largest holders of an item, descending by quantity.",
        after_help = "EXAMPLES:\n    sp locate Scrap\n    sp locate Scrap --limit 3"
    )]
    Locate(cmd::lookup::LocateArgs),

    #[command(
        next_help_heading = "Lookup",
        about = "Search item names",
        after_help = "EXAMPLES:\n    # Names containing \"iron\"\n    sp items iron\n\n    # Only what you hold\n    sp items --held"
    )]
    Items(cmd::lookup::ItemsArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Manage projects and requirements",
        after_help = "EXAMPLES:\n    sp project create Bunker\n    sp project require Bunker Scrap 1000\n    sp project requirements Bunker --export"
    )]
    Project(cmd::project::ProjectArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Manage conversion recipes",
        after_help = "EXAMPLES:\n    # 10 Scrap make 1 Widget\n    sp recipe add Widget Scrap 10\n    sp recipe show Widget"
    )]
    Recipe(cmd::recipe::RecipeArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Who could craft an item right now",
        long_about = "Show the recipe for an item and the holders with at least one batch of its input.",
        after_help = "EXAMPLES:\n    sp production Widget"
    )]
    Production(cmd::recipe::ProductionArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Project readiness report",
        long_about = "Show, per requirement, what is held, what could be crafted from spare inputs, and how many complete sets are available.",
        after_help = "EXAMPLES:\n    sp status Bunker\n    sp status Bunker --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Per-guild status dashboards",
        after_help = "EXAMPLES:\n    sp dashboard set 1 200 300 Bunker\n    sp dashboard show 1"
    )]
    Dashboard(cmd::dashboard::DashboardArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Delete every ledger entry",
        long_about = "Delete all stock for all actors. Items, recipes, projects and dashboards are kept.",
        after_help = "EXAMPLES:\n    sp wipe --confirm \"DELETE EVERYTHING\""
    )]
    Wipe(cmd::wipe::WipeArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    sp completions bash\n    sp completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STOCKPILE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "stockpile=debug,info"
        } else {
            "stockpile=info,warn"
        })
    });

    let format = env::var("STOCKPILE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn build_context(cli: &Cli) -> anyhow::Result<Ctx> {
    let root = env::current_dir()?;
    let flag = cli.flag_output().map(OutputMode::as_str);
    let effective = config::resolve_config(&root, flag).map_err(|err| {
        CliError::with_details(
            format!("{err:#}"),
            ErrorCode::ConfigParseError.hint().unwrap_or_default(),
            ErrorCode::ConfigParseError.code(),
        )
    })?;
    let output = OutputMode::from_resolved(&effective.resolved_output);
    Ok(Ctx::new(root, effective, output, cli.actor))
}

fn dispatch(command: Commands, ctx: &Ctx) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run_init(&args, ctx),
        Commands::Deposit(args) => cmd::stock::run_deposit(&args, ctx),
        Commands::Withdraw(args) => cmd::stock::run_withdraw(&args, ctx),
        Commands::Set(args) => cmd::stock::run_set(&args, ctx),
        Commands::Stock(args) => cmd::stock::run_stock(&args, ctx),
        Commands::Import(args) => cmd::stock::run_import(&args, ctx),
        Commands::Total(args) => cmd::lookup::run_total(&args, ctx),
        Commands::Locate(args) => cmd::lookup::run_locate(&args, ctx),
        Commands::Items(args) => cmd::lookup::run_items(&args, ctx),
        Commands::Project(args) => cmd::project::run_project(&args, ctx),
        Commands::Recipe(args) => cmd::recipe::run_recipe(&args, ctx),
        Commands::Production(args) => cmd::recipe::run_production(&args, ctx),
        Commands::Status(args) => cmd::status::run_status(&args, ctx),
        Commands::Dashboard(args) => cmd::dashboard::run_dashboard(&args, ctx),
        Commands::Wipe(args) => cmd::wipe::run_wipe(&args, ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn fail(mode: OutputMode, err: &anyhow::Error) -> ExitCode {
    tracing::debug!(error = %format!("{err:#}"), "command failed");
    if render_error(mode, &CliError::from_anyhow(err)).is_err() {
        eprintln!("error: {err:#}");
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(err) => return fail(cli.flag_output().unwrap_or(OutputMode::Text), &err),
    };

    match dispatch(cli.command, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(ctx.output(), &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_overrides_format() {
        let cli = Cli::parse_from(["sp", "--format", "pretty", "--json", "total", "Scrap"]);
        assert_eq!(cli.flag_output(), Some(OutputMode::Json));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["sp", "stock", "--actor", "42", "--format", "text"]);
        assert_eq!(cli.actor, Some(42));
        assert_eq!(cli.flag_output(), Some(OutputMode::Text));
        assert!(matches!(cli.command, Commands::Stock(_)));
    }

    #[test]
    fn no_flags_leaves_output_unresolved() {
        let cli = Cli::parse_from(["sp", "total", "Scrap"]);
        assert_eq!(cli.flag_output(), None);
        assert!(cli.actor.is_none());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["sp", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["sp", "init"],
            vec!["sp", "deposit", "Scrap", "5"],
            vec!["sp", "withdraw", "Scrap", "5"],
            vec!["sp", "set", "Scrap", "0"],
            vec!["sp", "stock", "--export"],
            vec!["sp", "import", "sheet.txt", "--overwrite"],
            vec!["sp", "total", "Scrap"],
            vec!["sp", "locate", "Scrap", "--limit", "3"],
            vec!["sp", "items", "--held"],
            vec!["sp", "project", "create", "Bunker"],
            vec!["sp", "project", "list"],
            vec!["sp", "project", "require", "Bunker", "Scrap", "100"],
            vec!["sp", "project", "requirements", "Bunker", "--export"],
            vec!["sp", "project", "import", "Bunker", "-"],
            vec!["sp", "recipe", "add", "Widget", "Scrap", "10"],
            vec!["sp", "recipe", "show", "Widget"],
            vec!["sp", "production", "Widget"],
            vec!["sp", "status", "Bunker"],
            vec!["sp", "dashboard", "set", "1", "2", "3", "Bunker"],
            vec!["sp", "dashboard", "show", "1"],
            vec!["sp", "wipe", "--confirm", "DELETE EVERYTHING"],
            vec!["sp", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "failed to parse {:?}: {:?}",
                args,
                result.err()
            );
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
