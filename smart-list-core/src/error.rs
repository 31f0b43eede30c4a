//! Error types for list operations.

use thiserror::Error;

use crate::cache::StorageError;
use crate::sync::TransportError;

#[derive(Debug, Error)]
pub enum ListError {
    /// Rejected input; nothing was changed.
    #[error("{0}")]
    Validation(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Item '{name}' not found in list {list_id}")]
    ItemNotFound { list_id: String, name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ListError {
    pub fn validation(message: impl Into<String>) -> Self {
        ListError::Validation(message.into())
    }

    /// The referenced list or item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ListError::ListNotFound(_) | ListError::ItemNotFound { .. }
        )
    }
}
