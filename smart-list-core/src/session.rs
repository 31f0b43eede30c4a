//! UI session state and command dispatch.

use crate::cache::KeyValueStore;
use crate::catalog::{Catalog, CatalogView};
use crate::engine::{AddOutcome, DuplicateChoice, DuplicateItem, ListSyncEngine};
use crate::error::ListError;
use crate::models::ItemKey;

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleList { list_id: String },
    AddItem { list_id: String, name: String, qty: u32 },
    /// Answer the duplicate raised by the last `AddItem` or catalog pick.
    ResolveDuplicate(DuplicateChoice),
    UpdateQty { list_id: String, key: ItemKey, input: String },
    RemoveItem { list_id: String, key: ItemKey },
    OpenCatalogForList { list_id: String },
    OpenCatalogFromMenu,
    SearchCatalog { term: String },
    SelectCatalogEntry { name: String },
    CloseCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Toggled { list_id: String, expanded: bool },
    Item(AddOutcome),
    Quantity(u32),
    Removed(bool),
    CatalogOpened { target: Option<String> },
    CatalogFiltered(CatalogView),
    CatalogClosed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Picker {
    open: bool,
    target: Option<String>,
    term: String,
}

/// Per-session state that sits outside the engine: the catalog picker and
/// an unanswered duplicate prompt.
#[derive(Debug, Clone)]
pub struct UiSession {
    catalog: Catalog,
    picker: Picker,
    pending: Option<DuplicateItem>,
}

impl UiSession {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            picker: Picker::default(),
            pending: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_catalog_open(&self) -> bool {
        self.picker.open
    }

    /// The list catalog picks are added to.
    pub fn catalog_target(&self) -> Option<&str> {
        self.picker.target.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.picker.term
    }

    pub fn catalog_view(&self) -> CatalogView {
        self.catalog.filter(&self.picker.term)
    }

    pub fn pending_duplicate(&self) -> Option<&DuplicateItem> {
        self.pending.as_ref()
    }

    pub fn dispatch<S: KeyValueStore>(
        &mut self,
        engine: &mut ListSyncEngine<S>,
        command: Command,
    ) -> Result<CommandOutcome, ListError> {
        match command {
            Command::ToggleList { list_id } => {
                let expanded = engine.toggle_list(&list_id)?;
                Ok(CommandOutcome::Toggled { list_id, expanded })
            }
            Command::AddItem { list_id, name, qty } => self.add(engine, &list_id, &name, qty),
            Command::ResolveDuplicate(choice) => {
                let duplicate = self.pending.take().ok_or_else(|| {
                    ListError::validation("No duplicate item is awaiting an answer")
                })?;
                let outcome = engine.resolve_duplicate(&duplicate, choice)?;
                Ok(CommandOutcome::Item(outcome))
            }
            Command::UpdateQty {
                list_id,
                key,
                input,
            } => Ok(CommandOutcome::Quantity(
                engine.update_qty(&list_id, &key, &input)?,
            )),
            Command::RemoveItem { list_id, key } => {
                Ok(CommandOutcome::Removed(engine.remove_item(&list_id, &key)?))
            }
            Command::OpenCatalogForList { list_id } => {
                engine.card(&list_id)?;
                self.picker.open = true;
                self.picker.target = Some(list_id.clone());
                Ok(CommandOutcome::CatalogOpened {
                    target: Some(list_id),
                })
            }
            Command::OpenCatalogFromMenu => {
                let target = engine.ensure_expanded();
                self.picker.open = true;
                self.picker.target = target.clone();
                Ok(CommandOutcome::CatalogOpened { target })
            }
            Command::SearchCatalog { term } => {
                self.picker.term = term;
                Ok(CommandOutcome::CatalogFiltered(self.catalog_view()))
            }
            Command::SelectCatalogEntry { name } => {
                let Some(list_id) = self.picker.target.clone().filter(|_| self.picker.open) else {
                    tracing::warn!("Catalog item '{}' picked with no list selected", name);
                    return Err(ListError::validation("No list selected"));
                };
                let entry = self
                    .catalog
                    .find(&name)
                    .map(|e| e.name.clone())
                    .ok_or_else(|| {
                        ListError::validation(format!("Unknown catalog item: {}", name))
                    })?;
                self.add(engine, &list_id, &entry, 1)
            }
            Command::CloseCatalog => {
                self.picker = Picker::default();
                Ok(CommandOutcome::CatalogClosed)
            }
        }
    }

    fn add<S: KeyValueStore>(
        &mut self,
        engine: &mut ListSyncEngine<S>,
        list_id: &str,
        name: &str,
        qty: u32,
    ) -> Result<CommandOutcome, ListError> {
        let outcome = engine.add_item(list_id, name, qty, None)?;
        self.pending = match &outcome {
            AddOutcome::Duplicate(dup) => Some(dup.clone()),
            _ => None,
        };
        Ok(CommandOutcome::Item(outcome))
    }
}
