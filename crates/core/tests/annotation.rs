use lanshare_core::annotator::AnnotationClient;
use lanshare_core::config::AiConfig;
use lanshare_core::coordinator::{AnalysisCoordinator, AnalysisOutcome};
use lanshare_core::models::{AnnotationResult, FileId};
use lanshare_core::store::FileStore;
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn gemini_config(server: &ServerGuard) -> AiConfig {
    AiConfig {
        base_url: Some(server.url()),
        timeout_secs: 5,
        ..AiConfig::default()
    }
}

fn candidate_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn missing_key_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .expect(0)
        .create_async()
        .await;

    let client = AnnotationClient::from_config(&gemini_config(&server), None).unwrap();
    let r = client.analyze("utils.js", "application/javascript", "1.17KB").await;

    assert_eq!(r, AnnotationResult::missing_key());
    assert_eq!(r.description, "API Key missing. Cannot generate analysis.");
    assert_eq!(r.tags, vec!["Error"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn valid_reply_round_trips_unmodified() {
    let mut server = Server::new_async().await;
    let reply = r#"{"description": "前端工具函数集合", "tags": ["a","b","c"]}"#;
    let mock = server
        .mock("POST", ENDPOINT)
        .match_header("x-goog-api-key", "secret")
        .match_body(Matcher::Regex("utils\\.js".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(reply))
        .expect(1)
        .create_async()
        .await;

    let client =
        AnnotationClient::from_config(&gemini_config(&server), Some("secret".into())).unwrap();
    let r = client.analyze("utils.js", "application/javascript", "1.17KB").await;

    assert_eq!(
        r,
        AnnotationResult {
            description: "前端工具函数集合".into(),
            tags: vec!["a".into(), "b".into(), "c".into()],
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn non_json_reply_yields_failure_result() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body("not json"))
        .create_async()
        .await;

    let client = AnnotationClient::from_config(&gemini_config(&server), Some("k".into())).unwrap();
    let r = client.analyze("a.bin", "application/octet-stream", "0.00KB").await;
    assert_eq!(r.description, "AI Analysis failed.");
    assert_eq!(r.tags, vec!["Unknown"]);
}

#[tokio::test]
async fn server_error_yields_failure_result() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .with_status(500)
        .with_body("internal")
        .expect(1)
        .create_async()
        .await;

    let client = AnnotationClient::from_config(&gemini_config(&server), Some("k".into())).unwrap();
    let r = client.analyze("a.bin", "application/octet-stream", "0.00KB").await;
    assert_eq!(r, AnnotationResult::failed());
    // a single attempt, no retries
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_service_yields_failure_result() {
    let ai = AiConfig {
        base_url: Some("http://127.0.0.1:9".into()),
        timeout_secs: 2,
        ..AiConfig::default()
    };
    let client = AnnotationClient::from_config(&ai, Some("k".into())).unwrap();
    let r = client.analyze("a.bin", "application/octet-stream", "0.00KB").await;
    assert_eq!(r, AnnotationResult::failed());
}

#[tokio::test]
async fn identical_calls_give_identical_results() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(r#"{"description":"d","tags":["x","y","z"]}"#))
        .expect(2)
        .create_async()
        .await;

    let client = AnnotationClient::from_config(&gemini_config(&server), Some("k".into())).unwrap();
    let first = client.analyze("a.pdf", "application/pdf", "1.00KB").await;
    let second = client.analyze("a.pdf", "application/pdf", "1.00KB").await;
    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn coordinator_applies_service_reply() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(
            r#"{"description":"示例描述","tags":["标签1","标签2","标签3"]}"#,
        ))
        .create_async()
        .await;

    let client = AnnotationClient::from_config(&gemini_config(&server), Some("k".into())).unwrap();
    let store = FileStore::with_demo_files(chrono::Utc::now()).into_shared();
    let coord = AnalysisCoordinator::new(store.clone(), Arc::new(client));
    let id = FileId::new("2");

    let pending = coord.trigger(&id).unwrap();
    assert!(store.lock().get(&id).unwrap().analyzing);
    assert_eq!(pending.await, AnalysisOutcome::Applied);

    let guard = store.lock();
    let item = guard.get(&id).unwrap();
    assert!(!item.analyzing);
    assert_eq!(item.description.as_deref(), Some("示例描述"));
    assert_eq!(item.tags.as_ref().map(Vec::len), Some(3));
}
