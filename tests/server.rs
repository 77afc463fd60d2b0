//! HTTP server tests over a scripted warehouse.

mod common;

use common::{test_config, ScriptedWarehouse};
use serde_json::{json, Value};
use std::sync::Arc;
use warehouse_docs::server::{router, AppState};
use warehouse_docs::warehouse::Warehouse;

async fn serve(warehouse: ScriptedWarehouse) -> String {
    let state = AppState {
        config: Arc::new(test_config("https://example.invalid")),
        warehouse: Arc::new(warehouse) as Arc<dyn Warehouse>,
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.ok();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health() {
    let base = serve(ScriptedWarehouse::new()).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_search_endpoint_filters_and_lists_paths() {
    let payload = json!({"results": [
        {"row": {"DOC_ID": 1, "RELATIVE_PATH": "inv.pdf", "DOC_TYPE": "invoice", "DOC_DATE": "2025-01-15"}},
        {"row": {"DOC_ID": 2, "RELATIVE_PATH": "memo.pdf", "DOC_TYPE": "memo", "DOC_DATE": "2025-01-16"}},
        {"row": {"DOC_ID": 3, "RELATIVE_PATH": "inv.pdf", "DOC_TYPE": "Invoice", "DOC_DATE": "2025-02-01"}}
    ]});
    let base = serve(ScriptedWarehouse::new().on_scalar("SEARCH_PREVIEW", payload)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"query": "invoice", "doc_type": "INVOICE", "date_to": "2025-01-31"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["hits"][0]["DOC_ID"], 1);
    assert_eq!(body["preview_paths"], json!(["inv.pdf"]));
}

#[tokio::test]
async fn test_search_endpoint_rejects_empty_query() {
    let base = serve(ScriptedWarehouse::new()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"query": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "Enter a search query first.");
}

#[tokio::test]
async fn test_search_endpoint_reports_warehouse_failure() {
    let base = serve(ScriptedWarehouse::new().on_fail("SEARCH_PREVIEW", "network down")).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"query": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "warehouse_error");
}

#[tokio::test]
async fn test_agent_endpoint() {
    let payload = json!({"messages": [{"content": "A"}, {"content": ""}, {"content": "B"}]});
    let base = serve(ScriptedWarehouse::new().on_scalar("EXECUTE_AGENT", payload)).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/agent", base))
        .json(&json!({"question": "which?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["answer"], "B");

    let resp = client
        .post(format!("{}/agent", base))
        .json(&json!({"question": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_tables_and_preview_endpoints() {
    let wh = ScriptedWarehouse::new()
        .on_scalar("INFORMATION_SCHEMA.TABLES", json!("RAW_DOCS"))
        .on_scalar("IDENTIFIER(?) LIMIT ?", json!(1));
    let base = serve(wh).await;

    let body: Value = reqwest::get(format!("{}/tables", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["columns"], json!(["RESULT"]));
    assert_eq!(body["rows"], json!([["RAW_DOCS"]]));

    let resp = reqwest::get(format!("{}/tables/RAW_DOCS/preview", base)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = reqwest::get(format!("{}/tables/bad%20name/preview", base)).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_presign_endpoint_warning_is_null_url() {
    let base = serve(ScriptedWarehouse::new().on_fail("GET_PRESIGNED_URL", "denied")).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{}/presign", base))
        .json(&json!({"path": "inv.pdf"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["url"], Value::Null);
}

#[tokio::test]
async fn test_unreadable_bodies_use_error_envelope() {
    let base = serve(ScriptedWarehouse::new()).await;
    let client = reqwest::Client::new();

    let cases = [
        ("/search", json!({})),
        ("/search", json!({"query": "x", "date_from": "15/01/2025"})),
        ("/agent", json!({"prompt": "wrong field"})),
        ("/presign", json!({"path": 7})),
    ];
    for (path, payload) in cases {
        let resp = client
            .post(format!("{}{}", base, path))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "{} {}", path, payload);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "bad_request");
        assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let base = serve(ScriptedWarehouse::new()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_presign_rejects_non_positive_validity() {
    let wh = ScriptedWarehouse::new().on_scalar("GET_PRESIGNED_URL", json!("https://stage/x"));
    let base = serve(wh).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/presign", base))
        .json(&json!({"path": "inv.pdf", "seconds": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}
