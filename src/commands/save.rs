use clap::Args;
use smart_list_core::{save_list, SaveOutcome};

use crate::context::{resolve_list, ListContext};

#[derive(Args)]
pub struct SaveCommand {
    /// List id, name or id prefix
    pub list: String,
}

impl SaveCommand {
    /// Push the list's cached items to the server.
    pub async fn run(&self, ctx: &mut ListContext) -> Result<(), Box<dyn std::error::Error>> {
        let (list_id, name) = {
            let engine = ctx.engine.lock().await;
            let list_id = resolve_list(engine.view(), &self.list)?;
            let name = engine.card(&list_id)?.name.clone();
            (list_id, name)
        };

        println!("💾 Saving {}...", name);
        match save_list(&ctx.engine, &ctx.remote, &list_id).await? {
            None => println!("A save for {} is already in progress.", name),
            Some(SaveOutcome::Saved { items, pending }) => {
                println!("💾 Saved {} ({} item(s))", name, items);
                if pending {
                    println!("Changes made during the save are not on the server yet.");
                }
            }
            Some(SaveOutcome::Failed(e)) => {
                return Err(format!("💾 Save Failed: {}", e).into());
            }
        }
        Ok(())
    }
}
