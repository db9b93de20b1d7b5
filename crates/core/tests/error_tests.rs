// ═══════════════════════════════════════════════════════════════════
// Error Tests — WatchlistError variants, Display formatting, status mapping
// ═══════════════════════════════════════════════════════════════════

use watchlist_core::errors::WatchlistError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn malformed_key() {
        let err = WatchlistError::MalformedKey("'x' must start with 'folder-'".into());
        assert_eq!(err.to_string(), "Malformed node key: 'x' must start with 'folder-'");
    }

    #[test]
    fn duplicate_name() {
        let err = WatchlistError::DuplicateName("group 'Tech' already exists".into());
        assert_eq!(err.to_string(), "Duplicate name: group 'Tech' already exists");
    }

    #[test]
    fn not_found() {
        assert_eq!(
            WatchlistError::NotFound("group 'Ghost'".into()).to_string(),
            "Not found: group 'Ghost'"
        );
    }

    #[test]
    fn invalid_target() {
        assert_eq!(
            WatchlistError::InvalidTarget("nope".into()).to_string(),
            "Invalid target: nope"
        );
    }

    #[test]
    fn api_includes_status() {
        let err = WatchlistError::Api {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "Server error (503): maintenance");
    }

    #[test]
    fn network_and_config() {
        assert_eq!(
            WatchlistError::Network("timed out".into()).to_string(),
            "Network error: timed out"
        );
        assert_eq!(
            WatchlistError::Config("bad url".into()).to_string(),
            "Configuration error: bad url"
        );
        assert_eq!(
            WatchlistError::Internal("lock poisoned".into()).to_string(),
            "Internal error: lock poisoned"
        );
    }
}

// ── Status mapping ──────────────────────────────────────────────────

mod from_status {
    use super::*;

    #[test]
    fn known_statuses() {
        assert!(matches!(WatchlistError::from_status(404, "x"), WatchlistError::NotFound(_)));
        assert!(matches!(WatchlistError::from_status(409, "x"), WatchlistError::DuplicateName(_)));
        assert!(matches!(WatchlistError::from_status(400, "x"), WatchlistError::InvalidTarget(_)));
        assert!(matches!(WatchlistError::from_status(422, "x"), WatchlistError::InvalidTarget(_)));
    }

    #[test]
    fn other_statuses_keep_code() {
        match WatchlistError::from_status(500, "boom") {
            WatchlistError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn message_is_verbatim() {
        let err = WatchlistError::from_status(409, "分组已存在");
        assert_eq!(err.to_string(), "Duplicate name: 分组已存在");
    }
}

// ── Classification ──────────────────────────────────────────────────

mod user_actionable {
    use super::*;

    #[test]
    fn hierarchy_failures_are_actionable() {
        assert!(WatchlistError::DuplicateName(String::new()).is_user_actionable());
        assert!(WatchlistError::NotFound(String::new()).is_user_actionable());
        assert!(WatchlistError::InvalidTarget(String::new()).is_user_actionable());
        assert!(WatchlistError::Api {
            status: 500,
            message: String::new()
        }
        .is_user_actionable());
    }

    #[test]
    fn plumbing_failures_are_not() {
        assert!(!WatchlistError::Network(String::new()).is_user_actionable());
        assert!(!WatchlistError::MalformedKey(String::new()).is_user_actionable());
        assert!(!WatchlistError::Deserialization(String::new()).is_user_actionable());
        assert!(!WatchlistError::Config(String::new()).is_user_actionable());
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn serde_json_error_becomes_deserialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: WatchlistError = json_err.into();
        assert!(matches!(err, WatchlistError::Deserialization(_)));
        assert!(err.to_string().starts_with("Deserialization error: "));
    }

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&WatchlistError::NotFound("x".into()));
    }
}
