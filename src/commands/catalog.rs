//! Catalog CLI commands.

use clap::{Args, Subcommand};
use smart_list_core::{CatalogView, Command, CommandOutcome};

use super::{add_with_prompt, describe_add, preset_choice, OutputFormat};
use crate::context::{resolve_list, ListContext};

#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// Search the catalog of common items
    Search {
        /// Text to look for in item names (shows everything when omitted)
        term: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add catalog items to a list
    Pick {
        /// List id, name or id prefix
        list: String,

        /// Catalog item names
        #[arg(required = true)]
        entries: Vec<String>,

        /// If an item exists, increase its quantity without asking
        #[arg(long, short, conflicts_with = "no")]
        yes: bool,

        /// If an item exists, leave the list unchanged without asking
        #[arg(long, short)]
        no: bool,
    },
}

impl CatalogCommand {
    pub async fn run(&self, ctx: &mut ListContext) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CatalogSubcommand::Search { term, format } => {
                let command = Command::SearchCatalog {
                    term: term.clone().unwrap_or_default(),
                };
                let outcome = {
                    let mut engine = ctx.engine.lock().await;
                    ctx.session.dispatch(&mut *engine, command)?
                };
                let view = match outcome {
                    CommandOutcome::CatalogFiltered(view) => view,
                    other => return Err(format!("Unexpected result: {:?}", other).into()),
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&view)?);
                    }
                    OutputFormat::Text => print_catalog(&view),
                }
                Ok(())
            }

            CatalogSubcommand::Pick {
                list,
                entries,
                yes,
                no,
            } => {
                {
                    let mut engine = ctx.engine.lock().await;
                    let list_id = resolve_list(engine.view(), list)?;
                    ctx.session
                        .dispatch(&mut *engine, Command::OpenCatalogForList { list_id })?;
                }

                let preset = preset_choice(*yes, *no);
                let mut result = Ok(());
                for entry in entries {
                    let command = Command::SelectCatalogEntry {
                        name: entry.clone(),
                    };
                    match add_with_prompt(ctx, command, preset).await {
                        Ok(outcome) => println!("{}", describe_add(entry, &outcome)),
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }

                let mut engine = ctx.engine.lock().await;
                ctx.session.dispatch(&mut *engine, Command::CloseCatalog)?;
                result
            }
        }
    }
}

fn print_catalog(view: &CatalogView) {
    if view.match_count() == 0 {
        println!("No catalog items match '{}'.", view.term);
        return;
    }

    for category in view.categories.iter().filter(|c| c.visible) {
        let marker = if category.expanded { "▾" } else { "▸" };
        match &category.icon {
            Some(icon) => println!("{} {} {}", marker, icon, category.name),
            None => println!("{} {}", marker, category.name),
        }
        for entry in category.visible_entries() {
            println!("    {}", entry.name);
        }
    }
    println!("\n{} item(s)", view.match_count());
}
