mod catalog;
mod config_cmd;
mod item;
mod list;
mod save;

pub use catalog::CatalogCommand;
pub use config_cmd::ConfigCommand;
pub use item::ItemCommand;
pub use list::ListCommand;
pub use save::SaveCommand;

use clap::ValueEnum;
use smart_list_core::{AddOutcome, Command, CommandOutcome, DuplicateChoice, DuplicateItem};
use std::io::{self, Write};

use crate::context::ListContext;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Answer to a duplicate prompt given up front with `--yes` / `--no`.
fn preset_choice(yes: bool, no: bool) -> Option<DuplicateChoice> {
    if yes {
        Some(DuplicateChoice::Increment)
    } else if no {
        Some(DuplicateChoice::Abort)
    } else {
        None
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn choose(
    duplicate: &DuplicateItem,
    preset: Option<DuplicateChoice>,
) -> io::Result<DuplicateChoice> {
    if let Some(choice) = preset {
        return Ok(choice);
    }
    let increment = confirm(&format!(
        "\"{}\" already exists in this list (qty {}). Increase its quantity? [y/N] ",
        duplicate.existing.name, duplicate.qty
    ))?;
    Ok(if increment {
        DuplicateChoice::Increment
    } else {
        DuplicateChoice::Abort
    })
}

/// Dispatch an add (typed or picked from the catalog), asking about
/// duplicates when needed.
async fn add_with_prompt(
    ctx: &mut ListContext,
    command: Command,
    preset: Option<DuplicateChoice>,
) -> Result<AddOutcome, Box<dyn std::error::Error>> {
    let mut engine = ctx.engine.lock().await;

    let outcome = match ctx.session.dispatch(&mut *engine, command)? {
        CommandOutcome::Item(AddOutcome::Duplicate(duplicate)) => {
            let choice = choose(&duplicate, preset)?;
            ctx.session
                .dispatch(&mut *engine, Command::ResolveDuplicate(choice))?
        }
        other => other,
    };

    match outcome {
        CommandOutcome::Item(outcome) => Ok(outcome),
        other => Err(format!("Unexpected result: {:?}", other).into()),
    }
}

fn describe_add(name: &str, outcome: &AddOutcome) -> String {
    match outcome {
        AddOutcome::Added => format!("Added: {}", name),
        AddOutcome::Incremented { qty } => format!("Increased {} to {}", name, qty),
        AddOutcome::Aborted => format!("Not added: {} is already on the list", name),
        AddOutcome::Duplicate(dup) => format!("{} is already on the list", dup.existing.name),
    }
}
