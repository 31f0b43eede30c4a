//! List CLI commands.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use smart_list_core::models::display_target_date;
use smart_list_core::{create_list, Command, CreateMode, ListCard, NewListForm};

use super::OutputFormat;
use crate::context::{resolve_list, ListContext};

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// Show lists and their items
    Show {
        /// List id, name or id prefix (all lists when omitted)
        list: Option<String>,

        /// Show the items of every list, not just the expanded one
        #[arg(long, short)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new list on the server
    Create {
        /// List name
        name: String,

        /// How often the list recurs (e.g., "weekly")
        #[arg(long, short)]
        frequency: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(long, short)]
        target_date: Option<String>,

        /// Rebuild every list from the cache afterwards
        #[arg(long)]
        reload: bool,
    },
}

impl ListCommand {
    pub async fn run(&self, ctx: &mut ListContext) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ListSubcommand::Show { list, all, format } => {
                let mut engine = ctx.engine.lock().await;

                let selected = match list {
                    Some(query) => {
                        let list_id = resolve_list(engine.view(), query)?;
                        if !engine.card(&list_id)?.expanded {
                            let toggle = Command::ToggleList {
                                list_id: list_id.clone(),
                            };
                            ctx.session.dispatch(&mut *engine, toggle)?;
                        }
                        Some(list_id)
                    }
                    None => None,
                };

                let cards: Vec<&ListCard> = engine
                    .view()
                    .cards
                    .iter()
                    .filter(|c| selected.as_deref().map_or(true, |id| c.list_id == id))
                    .collect();

                match format {
                    OutputFormat::Json => {
                        let output: Vec<serde_json::Value> =
                            cards.iter().map(|c| card_json(c)).collect();
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                    OutputFormat::Text => {
                        if cards.is_empty() {
                            println!("No lists found.");
                            println!("\nLoad lists with --snapshot or create one:");
                            println!("  smartlist list create <NAME>");
                            return Ok(());
                        }
                        for card in cards {
                            print_card(card, *all || selected.is_some());
                        }
                    }
                }
                Ok(())
            }

            ListSubcommand::Create {
                name,
                frequency,
                target_date,
                reload,
            } => {
                let mut form = NewListForm::new(name.clone());
                if let Some(freq) = frequency {
                    form = form.with_frequency(freq.clone());
                }
                if let Some(date) = target_date {
                    form = form.with_target_date(parse_date(date)?);
                }
                let mode = if *reload {
                    CreateMode::Reload
                } else {
                    CreateMode::InPlace
                };

                let created = create_list(&ctx.engine, &ctx.remote, &form, mode).await?;

                println!("Created list: {} ({})", created.name, created.id);
                if let Some(freq) = &created.frequency {
                    println!("  Frequency: {}", freq);
                }
                if let Some(date) = display_target_date(created.target_date) {
                    println!("  Target date: {}", date);
                }
                Ok(())
            }
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s).into())
}

fn print_card(card: &ListCard, show_items: bool) {
    let marker = if card.expanded { "▾" } else { "▸" };
    println!("{} {}  [{}]", marker, card.name, card.save);
    println!("  ID: {}", card.list_id);

    let mut details = Vec::new();
    if let Some(date) = display_target_date(card.target_date) {
        details.push(format!("📅 {}", date));
    }
    if let Some(freq) = &card.frequency {
        details.push(format!("🔄 {}", freq));
    }
    if !details.is_empty() {
        println!("  {}", details.join("  "));
    }

    if card.expanded || show_items {
        if card.rows.is_empty() {
            println!("  (no items)");
        }
        for row in &card.rows {
            match row.item_id {
                Some(id) => println!("  - {:<25} x{:<4} #{}", row.name, row.qty, id),
                None => println!("  - {:<25} x{:<4} (unsaved)", row.name, row.qty),
            }
        }
    }
    println!();
}

fn card_json(card: &ListCard) -> serde_json::Value {
    serde_json::json!({
        "list_id": card.list_id,
        "name": card.name,
        "target_date": display_target_date(card.target_date),
        "frequency": card.frequency,
        "expanded": card.expanded,
        "status": card.save.as_str(),
        "unsaved_changes": card.save.has_unsaved_changes(),
        "items": card.rows.iter().map(|row| serde_json::json!({
            "id": row.item_id,
            "name": row.name,
            "qty": row.qty,
        })).collect::<Vec<_>>(),
    })
}
