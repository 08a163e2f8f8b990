//! `sp recipe add|show` and `sp production`.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use stockpile_core::recipe::{self, ProductionChain, Recipe};

use crate::context::Ctx;
use crate::output::{render, thousands};

#[derive(Args, Debug)]
pub struct RecipeArgs {
    #[command(subcommand)]
    pub command: RecipeCommand,
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommand {
    #[command(about = "Define how an item is made (replaces any earlier recipe)")]
    Add {
        /// Item produced.
        output: String,
        /// Item consumed.
        input: String,
        /// Units of input per unit of output.
        #[arg(allow_negative_numbers = true)]
        ratio: i64,
    },

    #[command(about = "Show the recipe for an item")]
    Show {
        /// Item produced.
        output: String,
    },
}

#[derive(Args, Debug)]
pub struct ProductionArgs {
    /// Item to produce.
    pub output: String,

    /// Maximum producers to list (default from `[lookup] holders_limit`).
    #[arg(long, short)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    output: &'a str,
    recipe: Option<Recipe>,
}

#[derive(Debug, Serialize)]
struct ProductionOutput<'a> {
    output: &'a str,
    chain: Option<ProductionChain>,
}

pub fn run_recipe(args: &RecipeArgs, ctx: &Ctx) -> Result<()> {
    match &args.command {
        RecipeCommand::Add {
            output,
            input,
            ratio,
        } => {
            let mut conn = ctx.connect()?;
            let recipe = recipe::define(&mut conn, output, input, *ratio)?;
            render(ctx.output(), &recipe, |value, w| {
                writeln!(
                    w,
                    "✓ {} {} → 1 {}",
                    thousands(value.ratio),
                    value.input,
                    value.output
                )
            })
        }
        RecipeCommand::Show { output } => {
            let conn = ctx.connect()?;
            let payload = ShowOutput {
                output: output.trim(),
                recipe: recipe::lookup(&conn, output)?,
            };
            render(ctx.output(), &payload, |value, w| match &value.recipe {
                Some(recipe) => writeln!(
                    w,
                    "{}: {} {} each",
                    recipe.output,
                    thousands(recipe.ratio),
                    recipe.input
                ),
                None => writeln!(w, "No recipe for {}.", value.output),
            })
        }
    }
}

pub fn run_production(args: &ProductionArgs, ctx: &Ctx) -> Result<()> {
    let conn = ctx.connect()?;
    let limit = args.limit.unwrap_or_else(|| ctx.holders_limit());
    let payload = ProductionOutput {
        output: args.output.trim(),
        chain: recipe::production(&conn, &args.output, limit)?,
    };

    render(ctx.output(), &payload, |value, w| {
        let Some(chain) = &value.chain else {
            return writeln!(w, "No recipe for {}.", value.output);
        };
        let recipe = &chain.recipe;
        writeln!(
            w,
            "{} ← {} {} each",
            recipe.output,
            thousands(recipe.ratio),
            recipe.input
        )?;
        if chain.producers.is_empty() {
            return writeln!(w, "  Nobody holds enough {} for one batch.", recipe.input);
        }
        for producer in &chain.producers {
            writeln!(
                w,
                "  actor {:<20} holds {:>10}  can make {:>8}",
                producer.actor,
                thousands(producer.quantity),
                thousands(producer.can_make)
            )?;
        }
        Ok(())
    })
}
