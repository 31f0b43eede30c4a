//! HTTP client for the list endpoints of the SmartList backend.
//!
//! - `POST /api/lists/` creates a list and echoes it back.
//! - `POST /api/lists/{list_id}` replaces the list's items with the posted
//!   set and returns the resulting rows.

use chrono::{NaiveDate, SecondsFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{blank_as_none, target_date_format, ItemRecord, ListRecord};

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (connect failure, timeout).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Body of `POST /api/lists/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListRequest {
    pub name: String,
    pub frequency: Option<String>,
    pub target_date: Option<String>,
}

impl NewListRequest {
    /// Build a request, sending the target date as midnight UTC.
    pub fn new(
        name: impl Into<String>,
        frequency: Option<String>,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            name: name.into(),
            frequency,
            target_date: date.map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .unwrap_or_default()
                    .and_utc()
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            }),
        }
    }
}

/// Response of `POST /api/lists/`.
///
/// The backend answers with `""` for a missing frequency and Go's zero time
/// for a missing date; both normalize to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedList {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub frequency: Option<String>,
    #[serde(default, with = "target_date_format")]
    pub target_date: Option<NaiveDate>,
}

/// One row of a user's list as the backend reports it.
///
/// The save endpoint returns these for the updated list; the page loader
/// returns them for every list, with `ItemID` 0 standing in for a list
/// that has no items yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListRow {
    #[serde(rename = "ItemID", default)]
    pub item_id: i64,
    #[serde(rename = "ListID", default)]
    pub list_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Qty", default)]
    pub qty: i64,
    #[serde(rename = "ListName", default)]
    pub list_name: String,
    #[serde(rename = "ListFreq", default)]
    pub list_freq: String,
    #[serde(rename = "TargetDate", default)]
    pub target_date: Option<String>,
}

impl UserListRow {
    pub fn has_item(&self) -> bool {
        self.item_id > 0 && !self.name.trim().is_empty()
    }

    pub fn to_item(&self) -> ItemRecord {
        ItemRecord {
            id: (self.item_id > 0).then_some(self.item_id),
            name: self.name.clone(),
            qty: u32::try_from(self.qty).unwrap_or(1).max(1),
        }
    }
}

/// Map the rows returned by a save onto cache items, dropping nameless rows.
pub fn normalize_items(rows: &[UserListRow]) -> Vec<ItemRecord> {
    let mut items: Vec<ItemRecord> = Vec::with_capacity(rows.len());
    for row in rows {
        if row.name.trim().is_empty() {
            tracing::warn!("Skipping nameless row {} from server", row.item_id);
            continue;
        }
        let item = row.to_item();
        if item.id.is_some() && items.iter().any(|i| i.id == item.id) {
            continue;
        }
        items.push(item);
    }
    items
}

/// The remote side of list synchronization.
#[allow(async_fn_in_trait)]
pub trait ListRemote {
    async fn create_list(&self, request: &NewListRequest) -> Result<CreatedList, TransportError>;

    /// Replace the server's items for `record.list_id` with `record.items`.
    async fn replace_items(&self, record: &ListRecord) -> Result<Vec<UserListRow>, TransportError>;
}

/// [`ListRemote`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}{}", base, path)
        } else {
            format!("http://{}{}", base, path)
        }
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl ListRemote for HttpRemote {
    async fn create_list(&self, request: &NewListRequest) -> Result<CreatedList, TransportError> {
        let url = self.build_url("/api/lists/");
        let created: CreatedList = self.post_json(&url, request).await?;

        if created.id.trim().is_empty() {
            return Err(TransportError::InvalidResponse(
                "created list has no id".to_string(),
            ));
        }
        Ok(created)
    }

    async fn replace_items(&self, record: &ListRecord) -> Result<Vec<UserListRow>, TransportError> {
        let url = self.build_url(&format!(
            "/api/lists/{}",
            urlencoding::encode(&record.list_id)
        ));
        tracing::debug!("POST {} with {} item(s)", url, record.items.len());
        self.post_json(&url, record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn create_handler(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "name": body["name"],
            "frequency": body["frequency"].as_str().unwrap_or(""),
            "target_date": body["target_date"].as_str().unwrap_or("0001-01-01T00:00:00Z"),
        }))
    }

    // Assigns ids 100, 101, ... to unsaved items, like the database would.
    async fn save_handler(Path(list_id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["list_id"].as_str(), Some(list_id.as_str()));
        let rows: Vec<Value> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                json!({
                    "ItemID": item["id"].as_i64().unwrap_or(100 + i as i64),
                    "ListID": list_id,
                    "Name": item["name"],
                    "Qty": item["qty"],
                    "Unit": "",
                    "Price": 0,
                    "ListName": "Weekly",
                })
            })
            .collect();
        Json(Value::Array(rows))
    }

    fn remote(base: &str) -> HttpRemote {
        HttpRemote::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_url() {
        let remote = remote("http://localhost:8888/");
        assert_eq!(
            remote.build_url("/api/lists/"),
            "http://localhost:8888/api/lists/"
        );

        let bare = HttpRemote::new("localhost:8888", Duration::from_secs(1)).unwrap();
        assert_eq!(bare.build_url("/api/lists/L1"), "http://localhost:8888/api/lists/L1");
    }

    #[test]
    fn test_new_list_request_json() {
        let request = NewListRequest::new(
            "Party",
            None,
            NaiveDate::from_ymd_opt(2025, 12, 31),
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "Party", "frequency": null, "target_date": "2025-12-31T00:00:00.000Z"})
        );
    }

    #[test]
    fn test_normalize_items() {
        let rows: Vec<UserListRow> = serde_json::from_value(json!([
            {"ItemID": 5, "Name": "Milk", "Qty": 2, "ListID": "L1", "Price": 0},
            {"ItemID": 5, "Name": "Milk", "Qty": 2},
            {"ItemID": 6, "Name": "", "Qty": 1},
            {"ItemID": 7, "Name": "Eggs", "Qty": 0}
        ]))
        .unwrap();

        let items = normalize_items(&rows);
        assert_eq!(
            items,
            vec![
                ItemRecord::new("Milk").with_id(5).with_qty(2),
                ItemRecord::new("Eggs").with_id(7),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_list_roundtrip() {
        let base = spawn_server(Router::new().route("/api/lists/", post(create_handler))).await;

        let created = remote(&base)
            .create_list(&NewListRequest::new("Weekly", None, None))
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.name, "Weekly");
        assert_eq!(created.frequency, None);
        assert_eq!(created.target_date, None);
    }

    #[tokio::test]
    async fn test_create_list_without_id_is_invalid() {
        let app = Router::new().route(
            "/api/lists/",
            post(|| async { Json(json!({"name": "Weekly"})) }),
        );
        let base = spawn_server(app).await;

        let err = remote(&base)
            .create_list(&NewListRequest::new("Weekly", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_replace_items_roundtrip() {
        let base = spawn_server(Router::new().route("/api/lists/{id}", post(save_handler))).await;

        let record = ListRecord::new("L1").with_items(vec![
            ItemRecord::new("Milk").with_id(5).with_qty(2),
            ItemRecord::new("Bread"),
        ]);
        let rows = remote(&base).replace_items(&record).await.unwrap();

        assert_eq!(
            normalize_items(&rows),
            vec![
                ItemRecord::new("Milk").with_id(5).with_qty(2),
                ItemRecord::new("Bread").with_id(101),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let app = Router::new().route(
            "/api/lists/{id}",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "failed to update list") }),
        );
        let base = spawn_server(app).await;

        let err = remote(&base)
            .replace_items(&ListRecord::new("L1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status(500)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = remote(&format!("http://{}", addr))
            .replace_items(&ListRecord::new("L1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
