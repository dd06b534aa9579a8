//! Inventory HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Two calls: list the records of a scope, and change one record's status.

use std::time::Duration;

use stockcheck_recon::{InventoryReader, InventoryRecord, InventoryWriter, Status, StoreError};

use crate::auth::{load_auth, AuthCredentials};

/// Inventory API client (blocking).
#[derive(Clone)]
pub struct InventoryClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

/// Error type for inventory API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No auth credentials configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// File I/O error
    Io(String),
    /// Server rejected the request (400/422 with message)
    Validation(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::NotAuthenticated => write!(f, "Not authenticated, run `stockcheck login` first"),
            ClientError::Network(msg) => write!(f, "Network error: {}", msg),
            ClientError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ClientError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ClientError::Io(msg) => write!(f, "I/O error: {}", msg),
            ClientError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl InventoryClient {
    /// Create a new client using saved auth credentials.
    pub fn from_saved_auth() -> Result<Self, ClientError> {
        let creds = load_auth().ok_or(ClientError::NotAuthenticated)?;
        Self::new(creds)
    }

    /// Create a new client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("stockcheck/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: creds.api_base.trim_end_matches('/').to_string(),
            token: creds.token,
        })
    }

    pub fn with_base_url(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(AuthCredentials::new(token.into(), api_base.into()))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// All records for a store/location scope.
    pub fn list_records(&self, scope: &str) -> Result<Vec<InventoryRecord>, ClientError> {
        let url = self.endpoint(&["api", "inventory", scope, "records"])?;
        let resp = self.get(url)?;
        let json: serde_json::Value = resp.json().map_err(|e| ClientError::Parse(e.to_string()))?;
        let records = parse_records(&json)?;
        log::info!("fetched {} record(s) for scope '{}'", records.len(), scope);
        Ok(records)
    }

    /// Set one record's status, with an operator note.
    pub fn update_status(&self, record_id: &str, status: Status, note: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "inventory", "records", record_id, "status"])?;
        let body = serde_json::json!({
            "status": status.as_str(),
            "note": note,
        });
        self.post_json(url, &body)?;
        log::debug!("record '{}' set to {}", record_id, status);
        Ok(())
    }

    // ── HTTP helpers ────────────────────────────────────────────────

    /// Join path segments onto the API base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| ClientError::Validation(format!("Invalid API base '{}': {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation(format!("Invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: reqwest::Url) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self.http.get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        check_status(response)
    }

    fn post_json(&self, url: reqwest::Url, body: &serde_json::Value) -> Result<reqwest::blocking::Response, ClientError> {
        let response = self.http.post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        check_status(response)
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ClientError> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        if status == 422 || status == 400 {
            return Err(ClientError::Validation(body));
        }
        return Err(ClientError::Http(status, body));
    }
    Ok(response)
}

// ── Engine collaborators ────────────────────────────────────────────

impl InventoryReader for InventoryClient {
    fn list_records(&self, scope: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        InventoryClient::list_records(self, scope).map_err(|e| StoreError::new(e.to_string()))
    }
}

impl InventoryWriter for InventoryClient {
    fn update_status(&self, record_id: &str, status: Status, note: &str) -> Result<(), StoreError> {
        InventoryClient::update_status(self, record_id, status, note).map_err(|e| StoreError::new(e.to_string()))
    }
}

// ── Wire format ─────────────────────────────────────────────────────

/// Parse a records listing: either a bare array or `{"records": [...]}`.
///
/// Records that cannot be read (no id, no IMEI, unknown status) are skipped
/// with a warning.
pub fn parse_records(json: &serde_json::Value) -> Result<Vec<InventoryRecord>, ClientError> {
    let items = json.as_array()
        .or_else(|| json["records"].as_array())
        .ok_or_else(|| ClientError::Parse("Expected an array of records".into()))?;

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match parse_record(item) {
            Ok(rec) => records.push(rec),
            Err(msg) => log::warn!("skipping record #{}: {}", i, msg),
        }
    }
    Ok(records)
}

fn parse_record(v: &serde_json::Value) -> Result<InventoryRecord, String> {
    let id = json_str(v, "id").ok_or("missing id")?;
    let imei = json_str(v, "imei").ok_or_else(|| format!("record {} has no imei", id))?;
    let raw_status = v["status"].as_str().ok_or_else(|| format!("record {} has no status", id))?;
    let status: Status = raw_status.parse().map_err(|e| format!("record {}: {}", id, e))?;

    let mut rec = InventoryRecord::new(id, imei, status);
    rec.model = text(v, "model");
    rec.color = text(v, "color");
    rec.storage = text(v, "storage");
    rec.quality = text(v, "quality");
    rec.battery = v["battery"].as_u64().and_then(|n| u8::try_from(n).ok());
    rec.cost_cents = v["cost_cents"].as_i64()
        .or_else(|| v["cost"].as_f64().map(|c| (c * 100.0).round() as i64))
        .unwrap_or(0);
    rec.created_at = serde_json::from_value(v["created_at"].clone()).ok().flatten();
    rec.updated_at = serde_json::from_value(v["updated_at"].clone()).ok().flatten();
    Ok(rec)
}

/// String field that the API may send as a number.
fn json_str(json: &serde_json::Value, key: &str) -> Option<String> {
    json[key].as_i64()
        .map(|n| n.to_string())
        .or_else(|| json[key].as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
}

fn text(json: &serde_json::Value, key: &str) -> String {
    json_str(json, key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn record_json(id: i64, imei: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "imei": imei,
            "model": "iPhone 13",
            "color": "Blue",
            "storage": "128GB",
            "quality": "A",
            "battery": 91,
            "status": status,
            "cost": 420.5,
            "created_at": "2026-01-15T10:00:00Z",
        })
    }

    #[test]
    fn test_parse_bare_array() {
        let json = serde_json::json!([
            record_json(1, "356938035643809", "available"),
            record_json(2, "490154203237518", "internal_repair"),
        ]);
        let records = parse_records(&json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].cost_cents, 42050);
        assert_eq!(records[0].battery, Some(91));
        assert!(records[0].created_at.is_some());
        assert!(records[0].updated_at.is_none());
        assert_eq!(records[1].status, Status::InternalRepair);
    }

    #[test]
    fn test_parse_wrapped_and_string_ids() {
        let json = serde_json::json!({
            "records": [
                { "id": "dev-7", "imei": 356938035643809i64, "status": "Reserved", "cost_cents": 100 },
            ]
        });
        let records = parse_records(&json).unwrap();
        assert_eq!(records[0].id, "dev-7");
        assert_eq!(records[0].imei, "356938035643809");
        assert_eq!(records[0].status, Status::Reserved);
        assert_eq!(records[0].cost_cents, 100);
        assert_eq!(records[0].model, "");
    }

    #[test]
    fn test_parse_skips_unreadable_records() {
        let json = serde_json::json!([
            record_json(1, "111", "available"),
            record_json(2, "222", "in_transit"),
            { "id": 3, "status": "available" },
            { "imei": "444", "status": "available" },
        ]);
        let records = parse_records(&json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1");
    }

    #[test]
    fn test_parse_rejects_non_list() {
        let err = parse_records(&serde_json::json!({"data": 1})).unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    // ── httpmock tests ──────────────────────────────────────────────

    #[test]
    fn test_list_records_sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/inventory/downtown/records")
                .header("authorization", "Bearer tok_123");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!([record_json(1, "111", "available")]));
        });

        let client = InventoryClient::with_base_url("tok_123", server.base_url()).unwrap();
        let records = client.list_records("downtown").unwrap();

        mock.assert();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_trailing_slash_in_base_is_ignored() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/inventory/uptown/records");
            then.status(200).json_body(serde_json::json!({ "records": [] }));
        });

        let client = InventoryClient::with_base_url("t", format!("{}/", server.base_url())).unwrap();
        assert!(client.list_records("uptown").unwrap().is_empty());
        mock.assert();
    }

    #[test]
    fn test_update_status_posts_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/inventory/records/42/status")
                .json_body(serde_json::json!({ "status": "lost", "note": "shelf check" }));
            then.status(200).json_body(serde_json::json!({ "ok": true }));
        });

        let client = InventoryClient::with_base_url("t", server.base_url()).unwrap();
        client.update_status("42", Status::Lost, "shelf check").unwrap();
        mock.assert();
    }

    #[test]
    fn test_http_errors_are_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/inventory/records/1/status");
            then.status(422).body("status transition not allowed");
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/inventory/downtown/records");
            then.status(401).body("bad token");
        });

        let client = InventoryClient::with_base_url("t", server.base_url()).unwrap();
        assert_eq!(
            client.update_status("1", Status::Available, "").unwrap_err(),
            ClientError::Validation("status transition not allowed".into())
        );
        assert_eq!(
            client.list_records("downtown").unwrap_err(),
            ClientError::Http(401, "bad token".into())
        );
    }

    #[test]
    fn test_store_traits_map_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/inventory/downtown/records");
            then.status(500).body("boom");
        });

        let client = InventoryClient::with_base_url("t", server.base_url()).unwrap();
        let reader: &dyn InventoryReader = &client;
        let err = reader.list_records("downtown").unwrap_err();
        assert_eq!(err.message, "HTTP 500: boom");
    }

    #[test]
    fn test_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = InventoryClient::with_base_url("t", "http://127.0.0.1:9").unwrap();
        assert!(matches!(client.list_records("x").unwrap_err(), ClientError::Network(_)));
    }
}
