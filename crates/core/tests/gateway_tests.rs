// ═══════════════════════════════════════════════════════════════════
// Gateway Tests — MutationGateway over MemoryRemote, HTTP helpers
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use watchlist_core::errors::WatchlistError;
use watchlist_core::models::gesture::{MoveMode, SiblingPosition};
use watchlist_core::models::group::{StockGroup, WatchlistData, DEFAULT_GROUP};
use watchlist_core::models::path::GroupPath;
use watchlist_core::models::settings::GatewaySettings;
use watchlist_core::remote::http::{
    error_from_body, group_endpoint, note_endpoint, parse_groups, parse_optional_groups,
    stock_endpoint, HttpRemote,
};
use watchlist_core::remote::memory::MemoryRemote;
use watchlist_core::remote::traits::WatchlistRemote;
use watchlist_core::services::mutation_gateway::MutationGateway;

fn p(s: &str) -> GroupPath {
    GroupPath::new(s)
}

/// 默认分组 [TSLA] · Tech [MSFT, NVDA] · Energy [XOM]
fn sample() -> WatchlistData {
    let mut data = WatchlistData::default();
    data.groups.insert(
        DEFAULT_GROUP.to_string(),
        StockGroup::new("").with_stocks(["TSLA"]),
    );
    data.groups.insert(
        "Tech".to_string(),
        StockGroup::new("").with_stocks(["MSFT", "NVDA"]),
    );
    data.groups.insert(
        "Energy".to_string(),
        StockGroup::new("").with_stocks(["XOM"]),
    );
    data
}

// ═══════════════════════════════════════════════════════════════════
// Recording Remote
// ═══════════════════════════════════════════════════════════════════

/// Delegates to a [`MemoryRemote`] and records which endpoints were hit.
/// A treeless remote answers every mutation like a server replying
/// `{"message": "ok"}`.
struct RecordingRemote {
    inner: MemoryRemote,
    calls: Arc<Mutex<Vec<String>>>,
    treeless: bool,
}

impl RecordingRemote {
    fn new(data: WatchlistData) -> (Self, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let remote = Self {
            inner: MemoryRemote::new(data),
            calls: calls.clone(),
            treeless: false,
        };
        (remote, calls)
    }

    fn treeless(data: WatchlistData) -> (Self, Arc<Mutex<Vec<String>>>) {
        let (mut remote, calls) = Self::new(data);
        remote.treeless = true;
        (remote, calls)
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn answer(
        &self,
        out: Result<Option<WatchlistData>, WatchlistError>,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        if self.treeless {
            out.map(|_| None)
        } else {
            out
        }
    }
}

#[async_trait]
impl WatchlistRemote for RecordingRemote {
    fn name(&self) -> &str {
        "recording"
    }

    async fn fetch_watchlist(&self) -> Result<WatchlistData, WatchlistError> {
        self.record("fetch");
        self.inner.fetch_watchlist().await
    }

    async fn create_group(&self, path: &GroupPath, description: &str) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("create_group");
        self.answer(self.inner.create_group(path, description).await)
    }

    async fn delete_group(&self, path: &GroupPath) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("delete_group");
        self.answer(self.inner.delete_group(path).await)
    }

    async fn rename_group(&self, path: &GroupPath, new_name: &str) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("rename_group");
        self.answer(self.inner.rename_group(path, new_name).await)
    }

    async fn move_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        mode: MoveMode,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("move_group");
        self.answer(self.inner.move_group(source, target, mode).await)
    }

    async fn reorder_group(
        &self,
        source: &GroupPath,
        target: &GroupPath,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("reorder_group");
        self.answer(self.inner.reorder_group(source, target, position).await)
    }

    async fn add_stock(&self, symbol: &str, group: &GroupPath) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("add_stock");
        self.answer(self.inner.add_stock(symbol, group).await)
    }

    async fn move_stock(
        &self,
        symbol: &str,
        from_group: &GroupPath,
        to_group: &GroupPath,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("move_stock");
        self.answer(self.inner.move_stock(symbol, from_group, to_group).await)
    }

    async fn reorder_stock(
        &self,
        group: &GroupPath,
        source_symbol: &str,
        target_symbol: &str,
        position: SiblingPosition,
    ) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("reorder_stock");
        let out = self
            .inner
            .reorder_stock(group, source_symbol, target_symbol, position)
            .await;
        self.answer(out)
    }

    async fn remove_stock(&self, group: &GroupPath, symbol: &str) -> Result<Option<WatchlistData>, WatchlistError> {
        self.record("remove_stock");
        self.answer(self.inner.remove_stock(group, symbol).await)
    }

    async fn fetch_note(&self, symbol: &str) -> Result<String, WatchlistError> {
        self.record("fetch_note");
        self.inner.fetch_note(symbol).await
    }

    async fn update_note(&self, symbol: &str, note: &str) -> Result<(), WatchlistError> {
        self.record("update_note");
        self.inner.update_note(symbol, note).await
    }
}

fn recording_gateway() -> (MutationGateway, Arc<Mutex<Vec<String>>>) {
    let (remote, calls) = RecordingRemote::new(sample());
    (MutationGateway::new(Box::new(remote)), calls)
}

fn treeless_gateway() -> (MutationGateway, Arc<Mutex<Vec<String>>>) {
    let (remote, calls) = RecordingRemote::treeless(sample());
    (MutationGateway::new(Box::new(remote)), calls)
}

fn calls_of(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    calls.lock().unwrap().clone()
}

// ── MemoryRemote ────────────────────────────────────────────────────

mod memory_remote {
    use super::*;

    #[tokio::test]
    async fn failed_mutation_is_not_committed() {
        let remote = MemoryRemote::new(sample());
        let err = remote.delete_group(&p("Ghost")).await.unwrap_err();
        assert!(matches!(err, WatchlistError::NotFound(_)));
        assert_eq!(remote.snapshot().unwrap(), sample());
    }

    #[tokio::test]
    async fn stock_endpoints_answer_without_tree() {
        let remote = MemoryRemote::new(sample());
        let answer = remote.move_stock("XOM", &p("Energy"), &p("Tech")).await.unwrap();
        assert!(answer.is_none());
        let held = remote.snapshot().unwrap();
        assert_eq!(held.groups["Tech"].stocks, vec!["MSFT", "NVDA", "XOM"]);
    }

    #[tokio::test]
    async fn notes_default_to_empty() {
        let remote = MemoryRemote::default();
        assert_eq!(remote.fetch_note("AAPL").await.unwrap(), "");
        remote.update_note("AAPL", "services").await.unwrap();
        assert_eq!(remote.fetch_note("AAPL").await.unwrap(), "services");
    }
}

// ── MutationGateway ─────────────────────────────────────────────────

mod gateway {
    use super::*;

    #[tokio::test]
    async fn group_mutations_return_tree_directly() {
        let (gw, calls) = recording_gateway();
        let tree = gw.create_group(&p("Metals"), " gold ").await.unwrap();
        assert_eq!(tree.groups["Metals"].description, "gold");
        assert_eq!(calls_of(&calls), vec!["create_group"]);
    }

    #[tokio::test]
    async fn treeless_answer_triggers_refetch() {
        let (gw, calls) = recording_gateway();
        let tree = gw.move_stock("XOM", &p("Energy"), &p("Tech")).await.unwrap();
        assert!(tree.groups["Tech"].contains("XOM"));
        assert!(tree.groups["Energy"].stocks.is_empty());
        assert_eq!(calls_of(&calls), vec!["move_stock", "fetch"]);
    }

    #[tokio::test]
    async fn group_mutation_without_tree_refetches() {
        let (gw, calls) = treeless_gateway();
        let tree = gw.create_group(&p("Metals"), "").await.unwrap();
        assert!(tree.contains_group(&p("Metals")));
        assert_eq!(tree.groups["Tech"].stocks, vec!["MSFT", "NVDA"]);
        assert_eq!(calls_of(&calls), vec!["create_group", "fetch"]);
    }

    #[tokio::test]
    async fn every_treeless_mutation_yields_full_tree() {
        let (gw, calls) = treeless_gateway();
        let tree = gw.rename_group(&p("Energy"), "Oil").await.unwrap();
        assert!(tree.contains_group(&p("Oil")));
        let tree = gw
            .reorder_stock(&p("Tech"), "NVDA", "MSFT", SiblingPosition::Before)
            .await
            .unwrap();
        assert_eq!(tree.groups["Tech"].stocks, vec!["NVDA", "MSFT"]);
        let tree = gw.delete_group(&p("Oil")).await.unwrap();
        assert_eq!(tree.groups[DEFAULT_GROUP].stocks, vec!["TSLA", "XOM"]);
        assert_eq!(
            calls_of(&calls),
            vec!["rename_group", "fetch", "reorder_stock", "fetch", "delete_group", "fetch"]
        );
    }

    #[tokio::test]
    async fn failure_skips_refetch() {
        let (gw, calls) = treeless_gateway();
        assert!(gw.delete_group(&p("Ghost")).await.is_err());
        assert_eq!(calls_of(&calls), vec!["delete_group"]);
    }

    #[tokio::test]
    async fn add_stock_returns_tree_without_refetch() {
        let (gw, calls) = recording_gateway();
        let tree = gw.add_stock(" amd ", &p("Tech")).await.unwrap();
        assert_eq!(tree.groups["Tech"].stocks, vec!["MSFT", "NVDA", "AMD"]);
        assert_eq!(calls_of(&calls), vec!["add_stock"]);
    }

    #[tokio::test]
    async fn same_group_move_only_fetches() {
        let (gw, calls) = recording_gateway();
        let tree = gw.move_stock("XOM", &p("Energy"), &p("Energy")).await.unwrap();
        assert_eq!(tree, sample());
        assert_eq!(calls_of(&calls), vec!["fetch"]);
    }

    #[tokio::test]
    async fn empty_names_never_reach_the_remote() {
        let (gw, calls) = recording_gateway();
        assert!(matches!(
            gw.create_group(&p("Tech/ "), "").await,
            Err(WatchlistError::InvalidTarget(_))
        ));
        assert!(matches!(
            gw.rename_group(&p("Tech"), "   ").await,
            Err(WatchlistError::InvalidTarget(_))
        ));
        assert!(matches!(
            gw.add_stock("  ", &p("Tech")).await,
            Err(WatchlistError::InvalidTarget(_))
        ));
        assert!(calls_of(&calls).is_empty());
    }

    #[tokio::test]
    async fn server_errors_pass_through() {
        let (gw, _) = recording_gateway();
        let err = gw.rename_group(&p("Energy"), "Tech").await.unwrap_err();
        assert!(matches!(err, WatchlistError::DuplicateName(_)));
        assert!(err.is_user_actionable());
    }

    #[tokio::test]
    async fn remove_then_reorder() {
        let (gw, _) = recording_gateway();
        let tree = gw.remove_stock(&p("Tech"), "MSFT").await.unwrap();
        assert_eq!(tree.groups["Tech"].stocks, vec!["NVDA"]);

        let tree = gw.add_stock("AMD", &p("Tech")).await.unwrap();
        assert_eq!(tree.groups["Tech"].stocks, vec!["NVDA", "AMD"]);
        let tree = gw
            .reorder_stock(&p("Tech"), "AMD", "NVDA", SiblingPosition::Before)
            .await
            .unwrap();
        assert_eq!(tree.groups["Tech"].stocks, vec!["AMD", "NVDA"]);
    }

    #[tokio::test]
    async fn group_moves_and_reorders() {
        let (gw, _) = recording_gateway();
        let tree = gw
            .reorder_group(&p("Energy"), &p("Tech"), SiblingPosition::Before)
            .await
            .unwrap();
        let order: Vec<_> = tree.groups.keys().cloned().collect();
        assert_eq!(order, vec![DEFAULT_GROUP, "Energy", "Tech"]);

        let tree = gw.move_group(&p("Energy"), &p("Tech"), MoveMode::Into).await.unwrap();
        assert!(tree.contains_group(&p("Tech/Energy")));

        let tree = gw.delete_group(&p("Tech")).await.unwrap();
        assert_eq!(tree.groups[DEFAULT_GROUP].stocks, vec!["TSLA", "MSFT", "NVDA", "XOM"]);
    }

    #[tokio::test]
    async fn notes_round_trip() {
        let (gw, calls) = recording_gateway();
        gw.update_note("MSFT", "cloud").await.unwrap();
        assert_eq!(gw.fetch_note("MSFT").await.unwrap(), "cloud");
        assert_eq!(calls_of(&calls), vec!["update_note", "fetch_note"]);
    }

    #[test]
    fn reports_remote_name() {
        let (gw, _) = recording_gateway();
        assert_eq!(gw.remote_name(), "recording");
        assert!(format!("{gw:?}").contains("recording"));
    }
}

// ── HTTP helpers ────────────────────────────────────────────────────

mod http_helpers {
    use super::*;

    #[test]
    fn endpoints_encode_paths() {
        assert_eq!(group_endpoint(&p("Tech/Semis")), "/api/groups/Tech%2FSemis");
        assert_eq!(
            stock_endpoint(&p(DEFAULT_GROUP), "BRK.B"),
            "/api/watchlist/%E9%BB%98%E8%AE%A4%E5%88%86%E7%BB%84/BRK.B"
        );
        assert_eq!(note_endpoint("AAPL"), "/api/stock/note/AAPL");
    }

    #[test]
    fn parse_groups_body() {
        let data = parse_groups(r#"{"groups":{"Tech":{"description":"","stocks":["MSFT"]}}}"#).unwrap();
        assert_eq!(data.groups["Tech"].stocks, vec!["MSFT"]);
        assert!(parse_groups("{}").unwrap().groups.is_empty());
        assert!(matches!(
            parse_groups("not json"),
            Err(WatchlistError::Deserialization(_))
        ));
    }

    #[test]
    fn optional_tree() {
        assert!(parse_optional_groups(r#"{"groups":{}}"#).is_some());
        assert!(parse_optional_groups(r#"{"success":true}"#).is_none());
        assert!(parse_optional_groups(r#"{"message":"group created"}"#).is_none());
        assert!(parse_optional_groups("").is_none());
    }

    #[test]
    fn error_prefers_detail() {
        let err = error_from_body(409, r#"{"detail":"Group 'Tech' already exists"}"#);
        match err {
            WatchlistError::DuplicateName(msg) => assert_eq!(msg, "Group 'Tech' already exists"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_falls_back_to_error_field() {
        let err = error_from_body(400, r#"{"error":"cannot move into descendant"}"#);
        assert_eq!(err.to_string(), "Invalid target: cannot move into descendant");
    }

    #[test]
    fn error_falls_back_to_raw_body() {
        let err = error_from_body(502, "upstream down");
        assert_eq!(err.to_string(), "Server error (502): upstream down");
    }

    #[test]
    fn error_falls_back_to_reason_phrase() {
        let err = error_from_body(500, "");
        assert_eq!(err.to_string(), "Server error (500): Internal Server Error");
        assert!(matches!(error_from_body(404, "  "), WatchlistError::NotFound(_)));
    }

    #[test]
    fn http_remote_rejects_bad_settings() {
        assert!(matches!(
            HttpRemote::new(&GatewaySettings::new("localhost:8000")),
            Err(WatchlistError::Config(_))
        ));
        let remote = HttpRemote::new(&GatewaySettings::new("http://localhost:8000/")).unwrap();
        assert_eq!(remote.base_url(), "http://localhost:8000");
        assert_eq!(remote.name(), "http");
    }
}
