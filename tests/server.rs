use qualcode::config::Config;
use qualcode::server::{router, AppState};
use qualcode::{DocumentRecord, TaggingEngine};
use serde_json::{json, Value};

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_server(engine: TaggingEngine) -> String {
    let app = router(AppState::new(Config::minimal(), engine));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn three_docs() -> TaggingEngine {
    TaggingEngine::with_documents(vec![
        DocumentRecord::from_text("one"),
        DocumentRecord::from_text("two"),
        DocumentRecord::from_text("three"),
    ])
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server(TaggingEngine::new()).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_code_apply_export() {
    let base = spawn_server(three_docs()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/codes", base))
        .json(&json!({ "name": "urgent" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["codes"], json!(["urgent"]));

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/documents/2/codes", base))
            .json(&json!({ "code": "urgent" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["labels"], json!(["urgent"]));
    }

    let resp = client.get(format!("{}/export", base)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("coded_data_"));
    assert!(disposition.ends_with(".csv\""));
    let csv = resp.text().await.unwrap();
    assert_eq!(csv, "text,labels\none,\ntwo,urgent\nthree,\n");

    let body: Value = client
        .get(format!("{}/codes", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["counts"][0]["documents"], 1);
}

#[tokio::test]
async fn test_errors_map_to_status() {
    let base = spawn_server(three_docs()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/codes", base))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/documents/9/codes", base))
        .json(&json!({ "code": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let resp = client
        .post(format!("{}/documents/1/codes", base))
        .json(&json!({ "code": "never-added" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = client
        .get(format!("{}/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for row in body["documents"].as_array().unwrap() {
        assert_eq!(row["labels"], "");
    }
}

#[tokio::test]
async fn test_upload_replaces_documents_keeps_codes() {
    let base = spawn_server(three_docs()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/codes", base))
        .json(&json!({ "name": "keep" }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/documents/1/codes", base))
        .json(&json!({ "code": "keep" }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({ "format": "csv", "content": "id,text\na,refund please\nb,love it\n" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["documents"], 2);

    let body: Value = client
        .get(format!("{}/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = body["documents"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["document_id"], 1);
    assert_eq!(rows[0]["text"], "refund please");
    assert_eq!(rows[0]["labels"], "");

    let body: Value = client
        .get(format!("{}/codes", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["codes"], json!(["keep"]));

    let resp = client
        .post(format!("{}/documents", base))
        .json(&json!({ "format": "text", "content": "\n\n" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_analysis_endpoints() {
    let engine = TaggingEngine::with_documents(vec![
        DocumentRecord::from_text("refund was slow"),
        DocumentRecord::from_text("great refund service"),
    ]);
    let base = spawn_server(engine).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/frequencies?top=1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["terms"][0]["term"], "refund");
    assert_eq!(body["terms"][0]["count"], 2);

    let body: Value = client
        .get(format!("{}/sentiment", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["positive"], 1);
    assert_eq!(body["negative"], 1);

    let body: Value = client
        .get(format!("{}/themes?top=1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["themes"][0]["document_ids"], json!([1, 2]));

    let body: Value = client
        .get(format!("{}/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["documents"], 2);

    let resp = client
        .get(format!("{}/frequencies?top=0", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() {
    let base = spawn_server(TaggingEngine::with_documents(vec![DocumentRecord::from_text(
        "one",
    )]))
    .await;
    let client = reqwest::Client::new();
    client
        .post(format!("{}/codes", base))
        .json(&json!({ "name": "x" }))
        .send()
        .await
        .unwrap();

    for (id, status, code) in [
        ("-1", 404, "not_found"),
        ("0", 404, "not_found"),
        ("99999999999999999999999", 404, "not_found"),
        ("abc", 400, "bad_request"),
    ] {
        let resp = client
            .post(format!("{}/documents/{}/codes", base, id))
            .json(&json!({ "code": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), status, "id {}", id);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], code, "id {}", id);
    }

    let resp = client
        .post(format!("{}/documents/1/codes", base))
        .json(&json!({ "label": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/codes", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .get(format!("{}/frequencies?top=many", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let body: Value = client
        .get(format!("{}/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["documents"][0]["labels"], "");
}
