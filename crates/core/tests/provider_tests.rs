// ═══════════════════════════════════════════════════════════════════
// Provider Tests — response normalization, paging hints, auth checks,
// token store, HTTP source against a local mock API
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use spending_analysis_core::errors::CoreError;
use spending_analysis_core::models::filter::Granularity;
use spending_analysis_core::models::period::DateRange;
use spending_analysis_core::models::settings::Settings;
use spending_analysis_core::providers::auth::{check_response, MemoryTokenStore, TokenStore};
use spending_analysis_core::providers::http::HttpTransactionSource;
use spending_analysis_core::providers::response::{extract_items, has_next_page};
use spending_analysis_core::providers::traits::TransactionSource;

fn june_week() -> DateRange {
    let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
    DateRange::new(
        d(9).and_hms_opt(0, 0, 0).unwrap(),
        d(15).and_hms_opt(23, 59, 59).unwrap(),
        Granularity::Day,
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// extract_items
// ═══════════════════════════════════════════════════════════════════

mod extract_items {
    use super::*;

    #[test]
    fn bare_array() {
        let items = extract_items(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn null_is_empty() {
        assert!(extract_items(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn wrapped_under_data() {
        let items = extract_items(json!({"success": true, "data": [{"id": 1}]})).unwrap();
        assert_eq!(items, vec![json!({"id": 1})]);
    }

    #[test]
    fn every_known_wrapper_key() {
        for key in ["data", "items", "results", "content", "transactions", "docs", "records"] {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), json!([{"id": key}]));
            let items = extract_items(serde_json::Value::Object(body)).unwrap();
            assert_eq!(items.len(), 1, "key {key}");
        }
    }

    #[test]
    fn nested_paginated_shape() {
        let body = json!({
            "data": {
                "items": [{"id": 1}, {"id": 2}, {"id": 3}],
                "total": 3,
                "page": 1
            }
        });
        assert_eq!(extract_items(body).unwrap().len(), 3);
    }

    #[test]
    fn double_data_wrapper() {
        let body = json!({"data": {"data": [{"id": 1}]}});
        assert_eq!(extract_items(body).unwrap().len(), 1);
    }

    #[test]
    fn falls_through_to_later_keys() {
        let body = json!({"data": {"message": "ok"}, "items": [{"id": 9}]});
        assert_eq!(extract_items(body).unwrap(), vec![json!({"id": 9})]);
    }

    #[test]
    fn null_data_is_empty() {
        assert!(extract_items(json!({"data": null})).unwrap().is_empty());
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        for body in [
            json!({"error": "boom"}),
            json!("text"),
            json!(3),
            json!({"data": {"data": {"data": {"data": []}}}}),
        ] {
            assert!(
                matches!(extract_items(body.clone()), Err(CoreError::Deserialization(_))),
                "{body} should be rejected"
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// has_next_page
// ═══════════════════════════════════════════════════════════════════

mod has_next_page {
    use super::*;

    #[test]
    fn bare_array_carries_no_hint() {
        assert_eq!(has_next_page(&json!([1, 2, 3]), 1), None);
    }

    #[test]
    fn boolean_flags() {
        assert_eq!(has_next_page(&json!({"data": [], "hasNextPage": true}), 1), Some(true));
        assert_eq!(has_next_page(&json!({"data": [], "hasNextPage": false}), 1), Some(false));
        assert_eq!(has_next_page(&json!({"items": [], "hasMore": true}), 1), Some(true));
        assert_eq!(has_next_page(&json!({"items": [], "has_more": true}), 1), Some(true));
    }

    #[test]
    fn next_link() {
        assert_eq!(
            has_next_page(&json!({"results": [], "next": "/transactions?page=2"}), 1),
            Some(true)
        );
        assert_eq!(has_next_page(&json!({"results": [], "next": null}), 1), Some(false));
    }

    #[test]
    fn page_counters() {
        assert_eq!(has_next_page(&json!({"data": [], "page": 1, "totalPages": 3}), 1), Some(true));
        assert_eq!(has_next_page(&json!({"data": [], "page": 3, "totalPages": 3}), 3), Some(false));
        // Missing "page" falls back to the requested page number
        assert_eq!(has_next_page(&json!({"data": [], "total_pages": 2}), 1), Some(true));
        assert_eq!(has_next_page(&json!({"data": [], "total_pages": 2}), 2), Some(false));
    }

    #[test]
    fn metadata_under_meta_or_data() {
        assert_eq!(
            has_next_page(&json!({"data": [], "meta": {"page": 1, "totalPages": 2}}), 1),
            Some(true)
        );
        assert_eq!(
            has_next_page(&json!({"data": [], "pagination": {"hasNextPage": true}}), 1),
            Some(true)
        );
        assert_eq!(
            has_next_page(&json!({"data": {"items": [], "page": 1, "pages": 4}}), 1),
            Some(true)
        );
        assert_eq!(
            has_next_page(&json!({"data": {"items": [], "hasNextPage": false}}), 1),
            Some(false)
        );
    }

    #[test]
    fn wrapper_without_metadata_carries_no_hint() {
        assert_eq!(has_next_page(&json!({"data": [{"id": 1}]}), 1), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// check_response
// ═══════════════════════════════════════════════════════════════════

mod check_response {
    use super::*;

    #[test]
    fn success_statuses() {
        for status in [200, 201, 204, 299] {
            assert!(check_response("Api", status, "").is_ok());
        }
    }

    #[test]
    fn unauthorized_is_session_expired() {
        assert!(matches!(
            check_response("Api", 401, "whatever"),
            Err(CoreError::SessionExpired)
        ));
    }

    #[test]
    fn forbidden_with_expired_token_is_session_expired() {
        for body in [
            r#"{"message": "jwt expired"}"#,
            r#"{"error": "Token Expired"}"#,
            "Invalid token",
        ] {
            assert!(
                matches!(check_response("Api", 403, body), Err(CoreError::SessionExpired)),
                "{body}"
            );
        }
    }

    #[test]
    fn plain_forbidden_is_api_error() {
        match check_response("Api", 403, r#"{"message": "not your debt"}"#) {
            Err(CoreError::Api { provider, message }) => {
                assert_eq!(provider, "Api");
                assert!(message.starts_with("HTTP 403"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn server_error_includes_status() {
        match check_response("Api", 500, "") {
            Err(CoreError::Api { message, .. }) => assert_eq!(message, "HTTP 500"),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match check_response("Api", 502, &body) {
            Err(CoreError::Api { message, .. }) => assert!(message.len() < 250),
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryTokenStore
// ═══════════════════════════════════════════════════════════════════

mod token_store {
    use super::*;

    #[test]
    fn starts_empty() {
        assert_eq!(MemoryTokenStore::new().token(), None);
    }

    #[test]
    fn set_and_clear() {
        let store = MemoryTokenStore::with_token("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));
        store.set_token(Some("def".into()));
        assert_eq!(store.token().as_deref(), Some("def"));
        store.clear();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn shared_between_threads() {
        let store = Arc::new(MemoryTokenStore::new());
        let writer = Arc::clone(&store);
        std::thread::spawn(move || writer.set_token(Some("from-thread".into())))
            .join()
            .unwrap();
        assert_eq!(store.token().as_deref(), Some("from-thread"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// HttpTransactionSource
// ═══════════════════════════════════════════════════════════════════

mod http_source {
    use super::*;

    fn settings() -> Settings {
        Settings {
            api_base_url: "https://api.example.com/v1/".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn name() {
        let source = HttpTransactionSource::new(&settings(), Arc::new(MemoryTokenStore::new()));
        assert_eq!(source.name(), "TransactionsApi");
    }

    #[test]
    fn url_carries_window_and_paging() {
        let source = HttpTransactionSource::new(&settings(), Arc::new(MemoryTokenStore::new()));
        assert_eq!(
            source.transactions_url(&june_week(), 2),
            "https://api.example.com/v1/transactions?createFrom=1717891200000&createTo=1718495999000&page=2&limit=100"
        );
    }

    #[test]
    fn url_uses_the_wall_clock_offset() {
        let s = Settings {
            utc_offset_minutes: 7 * 60,
            ..settings()
        };
        let source = HttpTransactionSource::new(&s, Arc::new(MemoryTokenStore::new()));
        assert_eq!(
            source.transactions_url(&june_week(), 1),
            "https://api.example.com/v1/transactions?createFrom=1717866000000&createTo=1718470799000&page=1&limit=100"
        );
    }

    #[tokio::test]
    async fn missing_token_requires_login_without_a_request() {
        let source = HttpTransactionSource::new(&settings(), Arc::new(MemoryTokenStore::new()));
        let err = source.fetch_transactions(&june_week()).await.unwrap_err();
        assert!(err.requires_login());
    }
}

// ═══════════════════════════════════════════════════════════════════
// HttpTransactionSource — fetching from a local mock API
// ═══════════════════════════════════════════════════════════════════

mod http_fetch {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    type Responder = dyn Fn(u32) -> (u16, String) + Send + Sync;

    /// One request as the mock API saw it.
    #[derive(Debug, Clone)]
    struct Seen {
        page: u32,
        query: HashMap<String, String>,
        auth: Option<String>,
    }

    #[derive(Clone)]
    struct MockApi {
        respond: Arc<Responder>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl MockApi {
        fn pages(&self) -> Vec<u32> {
            self.seen.lock().unwrap().iter().map(|s| s.page).collect()
        }
    }

    async fn transactions(
        State(api): State<MockApi>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        let page = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        api.seen.lock().unwrap().push(Seen { page, query, auth });

        let (status, body) = (api.respond)(page);
        (StatusCode::from_u16(status).unwrap(), body)
    }

    /// Serve `respond` on an ephemeral local port; returns the base URL.
    async fn serve(respond: impl Fn(u32) -> (u16, String) + Send + Sync + 'static) -> (String, MockApi) {
        let api = MockApi {
            respond: Arc::new(respond),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/transactions", get(transactions))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (base, api)
    }

    fn items(ids: std::ops::Range<u32>) -> Vec<Value> {
        ids.map(|id| json!({"id": id, "type": "food", "amount": 1, "date": "2024-06-10"}))
            .collect()
    }

    fn ok(body: Value) -> (u16, String) {
        (200, body.to_string())
    }

    fn source(base: String, page_size: u32, max_pages: u32, tokens: Arc<MemoryTokenStore>) -> HttpTransactionSource {
        let settings = Settings {
            api_base_url: base,
            page_size,
            max_pages,
            ..Settings::default()
        };
        HttpTransactionSource::new(&settings, tokens)
    }

    fn ids(items: &[Value]) -> Vec<u64> {
        items.iter().map(|i| i["id"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn follows_paging_flags_and_concatenates_pages() {
        let (base, api) = serve(|page| match page {
            1 => ok(json!({"data": items(0..2), "hasNextPage": true})),
            _ => ok(json!({"data": items(2..3), "hasNextPage": false})),
        })
        .await;
        let tokens = Arc::new(MemoryTokenStore::with_token("secret"));

        let fetched = source(base, 2, 10, tokens)
            .fetch_transactions(&june_week())
            .await
            .unwrap();

        assert_eq!(ids(&fetched), vec![0, 1, 2]);
        assert_eq!(api.pages(), vec![1, 2]);

        let first = api.seen.lock().unwrap()[0].clone();
        assert_eq!(first.auth.as_deref(), Some("Bearer secret"));
        assert_eq!(first.query["limit"], "2");
        assert_eq!(first.query["createFrom"], "1717891200000");
        assert_eq!(first.query["createTo"], "1718495999000");
    }

    #[tokio::test]
    async fn full_pages_without_metadata_keep_paging() {
        let (base, api) = serve(|page| match page {
            1 => ok(json!(items(0..2))),
            2 => ok(json!(items(2..4))),
            _ => ok(json!(items(4..5))),
        })
        .await;

        let fetched = source(base, 2, 10, Arc::new(MemoryTokenStore::with_token("t")))
            .fetch_transactions(&june_week())
            .await
            .unwrap();

        assert_eq!(ids(&fetched), vec![0, 1, 2, 3, 4]);
        assert_eq!(api.pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn short_page_without_metadata_is_the_last() {
        let (base, api) = serve(|_| ok(json!({"data": items(0..1)}))).await;

        let fetched = source(base, 2, 10, Arc::new(MemoryTokenStore::with_token("t")))
            .fetch_transactions(&june_week())
            .await
            .unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(api.pages(), vec![1]);
    }

    #[tokio::test]
    async fn empty_page_ends_paging() {
        let (base, api) = serve(|page| match page {
            1 => ok(json!(items(0..2))),
            _ => ok(json!([])),
        })
        .await;

        let fetched = source(base, 2, 10, Arc::new(MemoryTokenStore::with_token("t")))
            .fetch_transactions(&june_week())
            .await
            .unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(api.pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn paging_stops_at_max_pages() {
        let (base, api) = serve(|page| {
            let start = (page - 1) * 2;
            ok(json!({"data": items(start..start + 2), "hasNextPage": true}))
        })
        .await;

        let fetched = source(base, 2, 3, Arc::new(MemoryTokenStore::with_token("t")))
            .fetch_transactions(&june_week())
            .await
            .unwrap();

        assert_eq!(ids(&fetched), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(api.pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unauthorized_clears_the_token() {
        let (base, _api) = serve(|_| (401, r#"{"message": "Unauthorized"}"#.to_string())).await;
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));

        let err = source(base, 2, 10, Arc::clone(&tokens))
            .fetch_transactions(&june_week())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::SessionExpired));
        assert_eq!(tokens.token(), None);
    }

    #[tokio::test]
    async fn forbidden_expired_token_clears_the_token() {
        let (base, _api) = serve(|_| (403, r#"{"message": "jwt expired"}"#.to_string())).await;
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));

        let err = source(base, 2, 10, Arc::clone(&tokens))
            .fetch_transactions(&june_week())
            .await
            .unwrap_err();

        assert!(err.requires_login());
        assert_eq!(tokens.token(), None);
    }

    #[tokio::test]
    async fn other_errors_keep_the_token() {
        let (base, _api) = serve(|_| (500, "boom".to_string())).await;
        let tokens = Arc::new(MemoryTokenStore::with_token("good"));

        let err = source(base, 2, 10, Arc::clone(&tokens))
            .fetch_transactions(&june_week())
            .await
            .unwrap_err();

        match err {
            CoreError::Api { provider, message } => {
                assert_eq!(provider, "TransactionsApi");
                assert_eq!(message, "HTTP 500: boom");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert_eq!(tokens.token().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn unparseable_body_is_an_api_error() {
        let (base, _api) = serve(|_| (200, "<html>".to_string())).await;

        let err = source(base, 2, 10, Arc::new(MemoryTokenStore::with_token("t")))
            .fetch_transactions(&june_week())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { .. }));
    }

    #[tokio::test]
    async fn later_page_expiry_fails_the_whole_fetch() {
        let (base, api) = serve(|page| match page {
            1 => ok(json!({"data": items(0..2), "hasNextPage": true})),
            _ => (401, String::new()),
        })
        .await;
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));

        let result = source(base, 2, 10, Arc::clone(&tokens))
            .fetch_transactions(&june_week())
            .await;

        assert!(matches!(result, Err(CoreError::SessionExpired)));
        assert_eq!(api.pages(), vec![1, 2]);
        assert_eq!(tokens.token(), None);
    }
}
