//! Integration tests for the catalog client against a mock action API

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use datastory_client::CatalogClient;
use datastory_core::auth::AccessToken;
use datastory_core::error::DatastoryError;
use datastory_core::models::{NewResource, PackageChanges, Resource};
use datastory_core::ports::CatalogApi;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Call {
    action: String,
    authorization: Option<String>,
    body: Value,
}

type Calls = Arc<Mutex<Vec<Call>>>;

fn package_json(notes: &str) -> Value {
    json!({
        "id": "pkg-1",
        "name": "oral-histories",
        "title": "Oral Histories",
        "notes": notes,
        "num_resources": 1,
        "resources": [
            {"id": "r1", "url": "https://files/interview.mp3", "name": "interview.mp3", "format": "MP3"}
        ]
    })
}

async fn action(
    State(calls): State<Calls>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    calls.lock().unwrap().push(Call {
        action: action.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let ok = |result: Value| {
        (
            StatusCode::OK,
            Json(json!({"help": "", "success": true, "result": result})),
        )
    };

    match action.as_str() {
        "package_search" => ok(json!({"count": 1, "results": [package_json("Interviews")]})),
        "package_show" if body["id"] == "pkg-1" => ok(package_json("Interviews")),
        "package_show" if body["id"] == "private" => (
            StatusCode::OK,
            Json(json!({
                "help": "",
                "success": false,
                "error": {"__type": "Authorization Error", "message": "Access denied"}
            })),
        ),
        "package_show" => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "help": "",
                "success": false,
                "error": {"__type": "Not Found Error", "message": "Not found"}
            })),
        ),
        "package_update" => ok(body),
        "resource_create" => ok(json!({
            "id": "r2",
            "url": body["url"],
            "name": body["name"],
            "package_id": body["package_id"]
        })),
        "resource_show" => ok(json!({"id": "r1", "url": "https://files/interview.mp3", "name": "interview.mp3"})),
        "resource_update" => ok(body),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"success": false}))),
    }
}

async fn serve() -> (String, Calls) {
    let calls: Calls = Arc::default();
    let app = Router::new()
        .route("/api/3/action/{action}", post(action))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), calls)
}

#[tokio::test]
async fn test_package_search_defaults_to_match_all() {
    let (base, calls) = serve().await;
    let client = CatalogClient::new(base);

    let result = client.package_search("", 10, 20).await.unwrap();

    assert_eq!(result.count, 1);
    assert_eq!(result.results[0].display_title(), "Oral Histories");

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].body, json!({"q": "*:*", "rows": 10, "start": 20}));
    assert!(calls[0].authorization.is_none());
}

#[tokio::test]
async fn test_package_show_produces_core_resource() {
    let (base, _) = serve().await;
    let client = CatalogClient::new(base);

    let package = client.package_show("pkg-1").await.unwrap();
    let resource = Resource::from_catalog(&package, package.resource("r1").unwrap());

    assert_eq!(resource.dataset.id, "pkg-1");
    assert_eq!(resource.name, "interview.mp3");
}

#[tokio::test]
async fn test_failed_envelope_becomes_catalog_error() {
    let (base, _) = serve().await;
    let client = CatalogClient::new(base);

    // The mock answers 404 with an envelope; the status wins
    let err = client.package_show("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    // A 200 response whose envelope reports failure
    let err = client.package_show("private").await.unwrap_err();
    match err {
        DatastoryError::CatalogAction { action, message } => {
            assert_eq!(action, "package_show");
            assert_eq!(message, "Authorization Error: Access denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_story_update_merges_notes_and_authenticates() {
    let (base, calls) = serve().await;
    let client = CatalogClient::new(base).with_token(AccessToken::parse("ckan-token"));

    let updated = client
        .package_update("pkg-1", &PackageChanges::notes("A new story"))
        .await
        .unwrap();

    assert_eq!(updated.notes.as_deref(), Some("A new story"));
    assert_eq!(updated.name, "oral-histories");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].action, "package_show");
    assert_eq!(calls[1].action, "package_update");
    assert_eq!(calls[1].authorization.as_deref(), Some("Bearer ckan-token"));
}

#[tokio::test]
async fn test_resource_create_links_url() {
    let (base, _) = serve().await;
    let client = CatalogClient::new(base);

    let created = client
        .resource_create(&NewResource {
            package_id: "pkg-1".to_string(),
            name: "transcript.json".to_string(),
            url: "https://files/transcript.json".to_string(),
            description: None,
            format: Some("JSON".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created.id, "r2");
    assert_eq!(created.package_id.as_deref(), Some("pkg-1"));
}
