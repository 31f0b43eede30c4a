//! Item CLI commands.

use clap::{Args, Subcommand};
use smart_list_core::models::parse_item_id;
use smart_list_core::{Command, CommandOutcome, ItemKey};

use super::{add_with_prompt, describe_add, preset_choice};
use crate::context::{resolve_list, ListContext};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item to a list
    Add {
        /// List id, name or id prefix
        list: String,

        /// Item name
        name: String,

        /// Quantity
        #[arg(long, short, default_value_t = 1)]
        qty: u32,

        /// If the item exists, increase its quantity without asking
        #[arg(long, short, conflicts_with = "no")]
        yes: bool,

        /// If the item exists, leave the list unchanged without asking
        #[arg(long, short)]
        no: bool,
    },

    /// Change an item's quantity
    Qty {
        /// List id, name or id prefix
        list: String,

        /// Item name
        name: String,

        /// New quantity (anything but a positive number becomes 1)
        #[arg(allow_hyphen_values = true)]
        qty: String,

        /// Server id of the item, when known
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove an item from a list
    Remove {
        /// List id, name or id prefix
        list: String,

        /// Item name
        name: String,

        /// Server id of the item, when known
        #[arg(long)]
        id: Option<String>,
    },
}

impl ItemCommand {
    pub async fn run(&self, ctx: &mut ListContext) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ItemSubcommand::Add {
                list,
                name,
                qty,
                yes,
                no,
            } => {
                let list_id = resolve_list(ctx.engine.lock().await.view(), list)?;
                let command = Command::AddItem {
                    list_id,
                    name: name.clone(),
                    qty: *qty,
                };

                let outcome = add_with_prompt(ctx, command, preset_choice(*yes, *no)).await?;
                println!("{}", describe_add(name.trim(), &outcome));
                Ok(())
            }

            ItemSubcommand::Qty { list, name, qty, id } => {
                let mut engine = ctx.engine.lock().await;
                let list_id = resolve_list(engine.view(), list)?;
                let command = Command::UpdateQty {
                    list_id,
                    key: ItemKey::new(id.as_deref().and_then(parse_item_id), name.clone()),
                    input: qty.clone(),
                };

                if let CommandOutcome::Quantity(qty) =
                    ctx.session.dispatch(&mut *engine, command)?
                {
                    println!("Updated {}: qty {}", name, qty);
                }
                Ok(())
            }

            ItemSubcommand::Remove { list, name, id } => {
                let mut engine = ctx.engine.lock().await;
                let list_id = resolve_list(engine.view(), list)?;
                let command = Command::RemoveItem {
                    list_id,
                    key: ItemKey::new(id.as_deref().and_then(parse_item_id), name.clone()),
                };

                match ctx.session.dispatch(&mut *engine, command)? {
                    CommandOutcome::Removed(true) => println!("Removed: {}", name),
                    _ => println!("Not on the list: {}", name),
                }
                Ok(())
            }
        }
    }
}
