//! End-to-end tests that drive the router with real HTTP requests against
//! an in-memory table.

use characters_api::router;
use lambda_http::http::header::LOCATION;
use lambda_http::http::{Method, Request as HttpRequest};
use lambda_http::{Body, Request, RequestExt, Response};
use repository::{CharacterStore, MemoryTable, StoreConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const API_KEY: &str = "testuser";

fn store() -> CharacterStore {
    CharacterStore::new(Arc::new(MemoryTable::new()), &StoreConfig::default())
}

fn request(method: Method, path: &str, body: Option<Value>) -> Request {
    let mut builder = HttpRequest::builder()
        .method(method)
        .uri(path)
        .header("Host", "api.heroes.example.com")
        .header("X-API-Key", API_KEY);

    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::Text(value.to_string())
        }
        None => Body::Empty,
    };

    builder.body(body).unwrap()
}

fn body_json(response: &Response<Body>) -> Value {
    match response.body() {
        Body::Text(text) => serde_json::from_str(text).expect("response body should be JSON"),
        other => panic!("unexpected body type: {other:?}"),
    }
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("the response should have a Location header")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn get_root_returns_api_information() {
    let store = store();

    let response = router::dispatch(&store, request(Method::GET, "/", None)).await;

    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["name"], "Super Tech Heroes API");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(
        body["links"]["characters"],
        "https://api.heroes.example.com/characters"
    );
}

#[tokio::test]
async fn a_fresh_user_has_no_characters() {
    let store = store();

    let response = router::dispatch(&store, request(Method::GET, "/characters", None)).await;

    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response), json!([]));
}

#[tokio::test]
async fn the_demo_account_gets_sample_data() {
    let store = store();

    let req = HttpRequest::builder()
        .method(Method::GET)
        .uri("/characters")
        .header("Host", "api.heroes.example.com")
        .body(Body::Empty)
        .unwrap();

    let response = router::dispatch(&store, req).await;

    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    let characters = body.as_array().unwrap();
    assert!(characters.len() >= 20, "got {} characters", characters.len());

    // Every resource carries a self link, and the list is sorted by name
    let names: Vec<&str> = characters
        .iter()
        .map(|character| character["name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(characters[0]["links"]["self"]
        .as_str()
        .unwrap()
        .starts_with("https://api.heroes.example.com/characters/"));
}

#[tokio::test]
async fn an_empty_api_key_also_falls_back_to_the_demo_account() {
    let store = store();

    let req = HttpRequest::builder()
        .method(Method::GET)
        .uri("/characters")
        .header("X-API-Key", "")
        .body(Body::Empty)
        .unwrap();

    let response = router::dispatch(&store, req).await;

    assert_eq!(response.status(), 200);
    assert!(!body_json(&response).as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_api_keys_are_rejected() {
    let store = store();

    let long_key = "a".repeat(51);
    for (key, message) in [
        ("abc", "The X-API-Key header is too short"),
        (long_key.as_str(), "The X-API-Key header is too long"),
        (
            "not valid!",
            "The X-API-Key header must be an alphanumeric string",
        ),
    ] {
        let req = HttpRequest::builder()
            .method(Method::GET)
            .uri("/characters")
            .header("X-API-Key", key)
            .body(Body::Empty)
            .unwrap();

        let response = router::dispatch(&store, req).await;

        assert_eq!(response.status(), 401);
        let body = body_json(&response);
        assert_eq!(body["error"], "UNAUTHORIZED");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn unknown_paths_return_404() {
    let store = store();

    let response = router::dispatch(&store, request(Method::GET, "/villains", None)).await;

    assert_eq!(response.status(), 404);
    let body = body_json(&response);
    assert_eq!(body["error"], "BAD_PATH");
    assert_eq!(
        body["message"],
        "The Super Tech Heroes API does not have a /villains endpoint"
    );
}

#[tokio::test]
async fn unsupported_methods_return_405() {
    let store = store();

    let response = router::dispatch(&store, request(Method::PATCH, "/characters", None)).await;

    assert_eq!(response.status(), 405);
    let body = body_json(&response);
    assert_eq!(body["error"], "BAD_METHOD");
    assert_eq!(body["message"], "The /characters endpoint does not allow PATCH");
}

#[tokio::test]
async fn posts_require_json_content() {
    let store = store();

    // No Content-Type header at all
    let req = HttpRequest::builder()
        .method(Method::POST)
        .uri("/characters")
        .header("X-API-Key", API_KEY)
        .body(Body::Text("{}".to_string()))
        .unwrap();
    let response = router::dispatch(&store, req).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        body_json(&response)["message"],
        "The POST /characters endpoint requires application/json content"
    );

    // An empty body
    let req = HttpRequest::builder()
        .method(Method::POST)
        .uri("/characters")
        .header("X-API-Key", API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::Empty)
        .unwrap();
    let response = router::dispatch(&store, req).await;
    assert_eq!(response.status(), 400);
    assert_eq!(body_json(&response)["message"], "The request body is empty");

    // A malformed body
    let req = HttpRequest::builder()
        .method(Method::POST)
        .uri("/characters")
        .header("X-API-Key", API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::Text("{not json".to_string()))
        .unwrap();
    let response = router::dispatch(&store, req).await;
    assert_eq!(response.status(), 400);
    let message = body_json(&response)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Error parsing JSON content."), "{message}");
}

#[tokio::test]
async fn creating_a_character_returns_201_with_a_location() {
    let store = store();

    let response = router::dispatch(
        &store,
        request(
            Method::POST,
            "/characters",
            Some(json!({
                "name": "Super Coder",
                "powers": ["10x productivity"],
                "sidekick": { "name": "The Intern" },
            })),
        ),
    )
    .await;

    assert_eq!(response.status(), 201);
    assert_eq!(
        location(&response),
        "https://api.heroes.example.com/characters/supercoder"
    );

    let body = body_json(&response);
    assert_eq!(body["name"], "Super Coder");
    assert_eq!(body["type"], "hero");
    assert_eq!(body["powers"], json!(["10x productivity"]));
    assert_eq!(
        body["links"]["self"],
        "https://api.heroes.example.com/characters/supercoder"
    );
    assert_eq!(
        body["links"]["sidekick"],
        "https://api.heroes.example.com/characters/theintern"
    );
    // Internal bookkeeping never leaks into resources
    assert!(body.get("user").is_none());
    assert!(body.get("expires").is_none());
    assert!(body.get("normalizedName").is_none());
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let store = store();

    let create = |name: &str| {
        request(
            Method::POST,
            "/characters",
            Some(json!({ "name": name })),
        )
    };

    let response = router::dispatch(&store, create("Super Coder")).await;
    assert_eq!(response.status(), 201);

    let response = router::dispatch(&store, create("Super Coder")).await;
    assert_eq!(response.status(), 409);
    let body = body_json(&response);
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(
        body["message"],
        "There is already another character named Super Coder"
    );
}

#[tokio::test]
async fn invalid_characters_are_rejected() {
    let store = store();

    let response = router::dispatch(
        &store,
        request(
            Method::POST,
            "/characters",
            Some(json!({ "name": "Mystery", "type": "antihero" })),
        ),
    )
    .await;

    assert_eq!(response.status(), 400);
    let body = body_json(&response);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert_eq!(
        body["message"],
        "The \"type\" value must be \"hero\", \"sidekick\", or \"villain\""
    );
}

#[tokio::test]
async fn characters_can_be_filtered_by_name_and_type() {
    let store = store();

    for (name, kind) in [
        ("Superman", "hero"),
        ("Batman", "hero"),
        ("Joker", "villain"),
    ] {
        let response = router::dispatch(
            &store,
            request(
                Method::POST,
                "/characters",
                Some(json!({ "name": name, "type": kind })),
            ),
        )
        .await;
        assert_eq!(response.status(), 201);
    }

    let req = request(Method::GET, "/characters", None).with_query_string_parameters(
        HashMap::from([("name".to_string(), vec!["man".to_string()])]),
    );
    let response = router::dispatch(&store, req).await;
    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|character| character["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Batman", "Superman"]);

    let req = request(Method::GET, "/characters", None).with_query_string_parameters(
        HashMap::from([("type".to_string(), vec!["villain".to_string()])]),
    );
    let response = router::dispatch(&store, req).await;
    let body = body_json(&response);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Joker");

    // An invalid type filter is a validation error
    let req = request(Method::GET, "/characters", None).with_query_string_parameters(
        HashMap::from([("type".to_string(), vec!["god".to_string()])]),
    );
    let response = router::dispatch(&store, req).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn a_character_can_be_fetched_by_its_slug() {
    let store = store();

    let response = router::dispatch(
        &store,
        request(
            Method::POST,
            "/characters",
            Some(json!({
                "name": "Super Coder",
                "nemesis": { "name": "The Feature Creep" },
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), 201);

    let response =
        router::dispatch(&store, request(Method::GET, "/characters/SuperCoder/", None)).await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        location(&response),
        "https://api.heroes.example.com/characters/supercoder"
    );
    let body = body_json(&response);
    assert_eq!(body["name"], "Super Coder");
    assert_eq!(
        body["links"]["nemesis"],
        "https://api.heroes.example.com/characters/thefeaturecreep"
    );
}

#[tokio::test]
async fn fetching_an_unknown_slug_returns_404() {
    let store = store();

    let response = router::dispatch(&store, request(Method::GET, "/characters/nobody", None)).await;

    assert_eq!(response.status(), 404);
    let body = body_json(&response);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "Character \"nobody\" does not exist");
}

#[tokio::test]
async fn a_character_can_be_replaced_by_its_slug() {
    let store = store();

    let response = router::dispatch(
        &store,
        request(Method::POST, "/characters", Some(json!({ "name": "Super Coder" }))),
    )
    .await;
    assert_eq!(response.status(), 201);
    let created = body_json(&response);

    let response = router::dispatch(
        &store,
        request(
            Method::PUT,
            "/characters/SuperCoder",
            Some(json!({
                "name": "Super Coder",
                "powers": ["Flawless code reviews"],
                "weakness": "Scope creep",
            })),
        ),
    )
    .await;

    assert_eq!(response.status(), 200);
    let updated = body_json(&response);
    assert_eq!(updated["links"]["self"], created["links"]["self"]);
    assert_eq!(updated["powers"], json!(["Flawless code reviews"]));
    assert_eq!(updated["weakness"], "Scope creep");
    assert_eq!(
        location(&response),
        "https://api.heroes.example.com/characters/supercoder"
    );
}

#[tokio::test]
async fn replacing_an_unknown_slug_returns_404() {
    let store = store();

    let response = router::dispatch(
        &store,
        request(
            Method::PUT,
            "/characters/nobody",
            Some(json!({ "name": "Nobody" })),
        ),
    )
    .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn deleting_all_characters_reports_the_count() {
    let store = store();

    for name in ["Super Coder", "The Incredible MVP"] {
        let response = router::dispatch(
            &store,
            request(Method::POST, "/characters", Some(json!({ "name": name }))),
        )
        .await;
        assert_eq!(response.status(), 201);
    }

    let response = router::dispatch(&store, request(Method::DELETE, "/characters", None)).await;

    assert_eq!(response.status(), 200);
    let body = body_json(&response);
    assert_eq!(body["count"], 2);
    assert_eq!(body["message"], "2 characters were deleted");

    // And now there is nothing left
    let response = router::dispatch(&store, request(Method::GET, "/characters", None)).await;
    assert_eq!(body_json(&response), json!([]));
}
