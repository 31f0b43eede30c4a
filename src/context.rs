//! Everything a command needs to work on lists: the engine over the local
//! cache, the backend client and the UI session.

use serde::Deserialize;
use smart_list_core::{
    Catalog, CatalogRow, FileStore, HttpRemote, ListCache, ListSyncEngine, UiSession,
    UserListRow, ViewState,
};
use std::path::Path;
use tokio::sync::Mutex;

use crate::config::Config;

pub struct ListContext {
    pub engine: Mutex<ListSyncEngine<FileStore>>,
    pub remote: HttpRemote,
    pub session: UiSession,
}

impl ListContext {
    /// Open the cache, bootstrap the engine and load the catalog.
    ///
    /// `snapshot` is a JSON file of list rows as the backend renders them;
    /// without one the view is built from the cache alone.
    pub fn open(
        config: &Config,
        snapshot: Option<&Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let initial = match snapshot {
            Some(path) => load_snapshot(path)?,
            None => ViewState::new(),
        };

        let cache = ListCache::new(FileStore::new(config.data_dir.value.clone()));
        let engine = ListSyncEngine::bootstrap(cache, initial, config.engine_options())?;
        let remote = HttpRemote::new(config.server_url.value.clone(), config.request_timeout())?;
        let session = UiSession::new(load_catalog(config)?);

        tracing::debug!(
            "Opened {} list(s) from {}",
            engine.view().cards.len(),
            config.data_dir.value.display()
        );

        Ok(Self {
            engine: Mutex::new(engine),
            remote,
            session,
        })
    }
}

pub fn load_snapshot(path: &Path) -> Result<ViewState, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read snapshot '{}': {}", path.display(), e))?;
    let rows: Vec<UserListRow> = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse snapshot '{}': {}", path.display(), e))?;
    Ok(ViewState::from_rows(&rows))
}

/// A catalog file holds either grouped categories or the flat rows the
/// backend's catalog query returns.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Rows(Vec<CatalogRow>),
    Grouped(Catalog),
}

/// The configured catalog file, or the built-in catalog.
pub fn load_catalog(config: &Config) -> Result<Catalog, Box<dyn std::error::Error>> {
    let Some(path) = &config.catalog_path.value else {
        return Ok(Catalog::builtin());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read catalog '{}': {}", path.display(), e))?;
    let file: CatalogFile = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse catalog '{}': {}", path.display(), e))?;
    Ok(match file {
        CatalogFile::Grouped(catalog) => catalog,
        CatalogFile::Rows(rows) => Catalog::from_rows(rows),
    })
}

/// Resolve a list argument: exact id, then list name ignoring case, then a
/// unique id prefix.
pub fn resolve_list(view: &ViewState, query: &str) -> Result<String, String> {
    let query = query.trim();
    if view.contains(query) {
        return Ok(query.to_string());
    }

    let by_name: Vec<&str> = view
        .cards
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case(query))
        .map(|c| c.list_id.as_str())
        .collect();
    match by_name.len() {
        0 => {}
        1 => return Ok(by_name[0].to_string()),
        n => {
            return Err(format!(
                "ambiguous list name '{}' matches {} lists: {}",
                query,
                n,
                by_name.join(", ")
            ))
        }
    }

    let by_prefix: Vec<&str> = view
        .cards
        .iter()
        .filter(|c| c.list_id.starts_with(query))
        .map(|c| c.list_id.as_str())
        .collect();
    match by_prefix.len() {
        0 => Err(format!("List not found: {}", query)),
        1 => Ok(by_prefix[0].to_string()),
        n => Err(format!(
            "ambiguous prefix '{}' matches {} lists: {}",
            query,
            n,
            by_prefix.join(", ")
        )),
    }
}
