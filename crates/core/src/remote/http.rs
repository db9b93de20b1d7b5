use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::debug;

use crate::errors::WatchlistError;
use crate::models::gesture::{MoveMode, SiblingPosition};
use crate::models::group::{StockGroup, WatchlistData};
use crate::models::path::GroupPath;
use crate::models::settings::GatewaySettings;

use super::traits::WatchlistRemote;

/// HTTP client for the watchlist server.
///
/// - **Bodies**: JSON in both directions.
/// - **Trees**: `GET /api/watchlist` answers `{"groups": {...}}`; mutations
///   may or may not echo the tree back, so they surface it as an `Option`.
/// - **Errors**: non-2xx responses carry a `detail` or `error` string that is
///   surfaced verbatim; the status picks the error variant.
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(settings: &GatewaySettings) -> Result<Self, WatchlistError> {
        settings.validate()?;
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        Ok(Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.normalized_base_url().to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, WatchlistError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn send_for_tree(&self, request: RequestBuilder) -> Result<WatchlistData, WatchlistError> {
        let body = self.send(request).await?;
        parse_groups(&body)
    }

    async fn send_for_optional_tree(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = self.send(request).await?;
        Ok(parse_optional_groups(&body))
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GroupsResponse {
    groups: Option<IndexMap<String, StockGroup>>,
}

#[derive(Deserialize)]
struct NoteResponse {
    #[serde(default)]
    note: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct CreateGroupRequest<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct RenameGroupRequest<'a> {
    old_path: &'a str,
    new_name: &'a str,
}

#[derive(Serialize)]
struct MoveGroupRequest<'a> {
    source_group: &'a str,
    target_group: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<SiblingPosition>,
}

#[derive(Serialize)]
struct ReorderGroupRequest<'a> {
    source_group: &'a str,
    target_group: &'a str,
    position: SiblingPosition,
}

#[derive(Serialize)]
struct AddStockRequest<'a> {
    symbol: &'a str,
    group: &'a str,
}

#[derive(Serialize)]
struct MoveStockRequest<'a> {
    symbol: &'a str,
    from_group: &'a str,
    to_group: &'a str,
}

#[derive(Serialize)]
struct ReorderStockRequest<'a> {
    group: &'a str,
    source_symbol: &'a str,
    target_symbol: &'a str,
    position: SiblingPosition,
}

#[derive(Serialize)]
struct UpdateNoteRequest<'a> {
    symbol: &'a str,
    note: &'a str,
}

// ── Pure helpers ────────────────────────────────────────────────────

/// `/api/groups/{path}` with the whole path encoded as one segment.
#[must_use]
pub fn group_endpoint(path: &GroupPath) -> String {
    format!("/api/groups/{}", urlencoding::encode(path.as_str()))
}

/// `/api/watchlist/{group}/{symbol}`, both segments encoded.
#[must_use]
pub fn stock_endpoint(group: &GroupPath, symbol: &str) -> String {
    format!(
        "/api/watchlist/{}/{}",
        urlencoding::encode(group.as_str()),
        urlencoding::encode(symbol)
    )
}

/// `/api/stock/note/{symbol}`.
#[must_use]
pub fn note_endpoint(symbol: &str) -> String {
    format!("/api/stock/note/{}", urlencoding::encode(symbol))
}

/// Parse the `GET /api/watchlist` body. A missing `groups` key is an empty
/// tree, which only makes sense for the fetch endpoint.
pub fn parse_groups(body: &str) -> Result<WatchlistData, WatchlistError> {
    let parsed: GroupsResponse = serde_json::from_str(body)?;
    Ok(WatchlistData::new(parsed.groups.unwrap_or_default()))
}

/// Like [`parse_groups`], but `None` when the body carries no tree.
#[must_use]
pub fn parse_optional_groups(body: &str) -> Option<WatchlistData> {
    serde_json::from_str::<GroupsResponse>(body)
        .ok()
        .and_then(|r| r.groups)
        .map(WatchlistData::new)
}

/// Build the error for a failed response: the server's `detail`, else its
/// `error`, else the raw body, else the status' reason phrase.
#[must_use]
pub fn error_from_body(status: u16, body: &str) -> WatchlistError {
    let from_json = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.detail.or(e.error))
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
    let message = from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string()
        });
    WatchlistError::from_status(status, message)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WatchlistRemote for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_watchlist(&self) -> Result<WatchlistData, WatchlistError> {
        debug!(base = %self.base_url, "GET /api/watchlist");
        self.send_for_tree(self.client.get(self.url("/api/watchlist"))).await
    }

    async fn create_group(
        &self,
        path: &GroupPath,
        description: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = CreateGroupRequest {
            name: path.as_str(),
            description,
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/groups")).json(&body))
            .await
    }

    async fn delete_group(&self, path: &GroupPath) -> Result<Option<WatchlistData>, WatchlistError> {
        self.send_for_optional_tree(self.client.delete(self.url(&group_endpoint(path))))
            .await
    }

    async fn rename_group(
        &self,
        path: &GroupPath,
        new_name: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = RenameGroupRequest {
            old_path: path.as_str(),
            new_name,
        };
        self.send_for_optional_tree(self.client.put(self.url("/api/groups/rename")).json(&body))
            .await
    }

    async fn move_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let position = match mode {
            MoveMode::Into => None,
            MoveMode::Before => Some(SiblingPosition::Before),
            MoveMode::After => Some(SiblingPosition::After),
        };
        let body = MoveGroupRequest {
            source_group: source.as_str(),
            target_group: target.as_str(),
            position,
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/groups/move")).json(&body))
            .await
    }

    async fn reorder_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = ReorderGroupRequest {
            source_group: source.as_str(),
            target_group: target.as_str(),
            position,
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/groups/reorder")).json(&body))
            .await
    }

    async fn add_stock(
        &self,
        symbol: &str,
        group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = AddStockRequest {
            symbol,
            group: group.as_str(),
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/watchlist")).json(&body))
            .await
    }

    async fn move_stock(
        &self,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = MoveStockRequest {
            symbol,
            from_group: from_group.as_str(),
            to_group: to_group.as_str(),
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/watchlist/move")).json(&body))
            .await
    }

    async fn reorder_stock(
        &self,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        let body = ReorderStockRequest {
            group: group.as_str(),
            source_symbol,
            target_symbol,
            position,
        };
        self.send_for_optional_tree(self.client.post(self.url("/api/watchlist/reorder")).json(&body))
            .await
    }

    async fn remove_stock(
        &self,
        group: &GroupPath,
        symbol: &str,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.send_for_optional_tree(self.client.delete(self.url(&stock_endpoint(group, symbol))))
            .await
    }

    async fn fetch_note(&self, symbol: &str) -> Result<String, WatchlistError> {
        let body = self
            .send(self.client.get(self.url(&note_endpoint(symbol))))
            .await?;
        let parsed: NoteResponse = serde_json::from_str(&body)?;
        Ok(parsed.note.unwrap_or_default())
    }

    async fn update_note(&self, symbol: &str, note: &str) -> Result<(), WatchlistError> {
        let body = UpdateNoteRequest { symbol, note };
        self.send(self.client.post(self.url("/api/stock/note")).json(&body))
            .await?;
        Ok(())
    }
}
