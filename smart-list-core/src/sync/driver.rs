//! Async drivers that run a save or list creation against a remote.
//!
//! The engine lock is held only for the synchronous steps before and after
//! the request, so other edits can land while the request is out.

use chrono::NaiveDate;
use std::time::Instant;
use tokio::sync::Mutex;

use super::remote::{CreatedList, ListRemote, NewListRequest};
use crate::cache::KeyValueStore;
use crate::engine::{CreateMode, ListSyncEngine, SaveOutcome};
use crate::error::ListError;

/// Input of the "create new list" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewListForm {
    pub name: String,
    pub frequency: Option<String>,
    pub target_date: Option<NaiveDate>,
}

impl NewListForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// Check the form and build the request body.
    pub fn validate(&self) -> Result<NewListRequest, ListError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ListError::validation("List name is required"));
        }

        let frequency = self
            .frequency
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        Ok(NewListRequest::new(name, frequency, self.target_date))
    }
}

/// Save one list. Returns `None` if a save for it was already running.
pub async fn save_list<S, R>(
    engine: &Mutex<ListSyncEngine<S>>,
    remote: &R,
    list_id: &str,
) -> Result<Option<SaveOutcome>, ListError>
where
    S: KeyValueStore,
    R: ListRemote,
{
    let Some(ticket) = engine.lock().await.begin_save(list_id)? else {
        return Ok(None);
    };

    let result = remote.replace_items(&ticket.payload).await;

    let outcome = engine
        .lock()
        .await
        .finish_save(ticket, result, Instant::now())?;
    Ok(Some(outcome))
}

/// Create a list on the server and add it to the cache and view.
///
/// Nothing local changes if validation or the request fails.
pub async fn create_list<S, R>(
    engine: &Mutex<ListSyncEngine<S>>,
    remote: &R,
    form: &NewListForm,
    mode: CreateMode,
) -> Result<CreatedList, ListError>
where
    S: KeyValueStore,
    R: ListRemote,
{
    let request = form.validate()?;
    let created = remote.create_list(&request).await.map_err(|e| {
        tracing::error!("Failed to create list '{}': {}", request.name, e);
        e
    })?;

    engine.lock().await.insert_created_list(&created, mode)?;
    tracing::debug!("Created list {} ({})", created.name, created.id);
    Ok(created)
}
