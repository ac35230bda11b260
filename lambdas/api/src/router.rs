//! Request routing: authentication, body parsing, and first-match-wins
//! dispatch over an ordered regex route table.

use crate::handlers;
use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use model::validate;
use regex::Regex;
use repository::CharacterStore;
use response::{ApiError, ErrorCode};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    ApiInfo,
    FindCharacters,
    CreateCharacter,
    DeleteAllCharacters,
    GetCharacter,
    UpdateCharacter,
}

struct Route {
    pattern: Regex,
    methods: &'static [(&'static str, Endpoint)],
}

static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    vec![
        Route {
            pattern: Regex::new(r"(?i)^/?$").expect("valid regex"),
            methods: &[("GET", Endpoint::ApiInfo)],
        },
        Route {
            pattern: Regex::new(r"(?i)^/characters/?$").expect("valid regex"),
            methods: &[
                ("GET", Endpoint::FindCharacters),
                ("POST", Endpoint::CreateCharacter),
                ("DELETE", Endpoint::DeleteAllCharacters),
            ],
        },
        Route {
            pattern: Regex::new(r"(?i)^/characters/(.+?)/?$").expect("valid regex"),
            methods: &[
                ("GET", Endpoint::GetCharacter),
                ("PUT", Endpoint::UpdateCharacter),
            ],
        },
    ]
});

/// Everything a handler needs to process one request.
pub struct RequestContext<'a> {
    pub store: &'a CharacterStore,
    pub request: &'a Request,
    pub user: String,
    pub body: Option<serde_json::Value>,
    pub params: Vec<String>,
}

/// Handles one incoming HTTP request from AWS API Gateway, converting any
/// failure into a uniform error response.
pub async fn dispatch(store: &CharacterStore, request: Request) -> Response<Body> {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    tracing::info!(method, path, "request");

    let response = match handle(store, &request).await {
        Ok(response) => response,
        Err(err) => {
            if err.code == ErrorCode::ServerError {
                tracing::error!(method, path, error = err.code.as_str(), message = %err.message);
            } else {
                tracing::warn!(method, path, error = err.code.as_str(), message = %err.message);
            }
            response::error(&err)
        }
    };

    tracing::info!(method, path, status = response.status().as_u16(), "response");
    response
}

async fn handle(store: &CharacterStore, request: &Request) -> Result<Response<Body>, ApiError> {
    let user = authenticate(request)?;
    let body = parse_body(request)?;
    let (endpoint, params) = find_route(request.uri().path(), request.method())?;

    let ctx = RequestContext {
        store,
        request,
        user,
        body,
        params,
    };

    match endpoint {
        Endpoint::ApiInfo => handlers::api_info(&ctx),
        Endpoint::FindCharacters => handlers::find_characters(&ctx).await,
        Endpoint::CreateCharacter => handlers::create_character(&ctx).await,
        Endpoint::DeleteAllCharacters => handlers::delete_all_characters(&ctx).await,
        Endpoint::GetCharacter => handlers::get_character(&ctx).await,
        Endpoint::UpdateCharacter => handlers::update_character(&ctx).await,
    }
}

/// Ensures the request carries a valid X-API-Key. A missing (or empty) key
/// falls back to the shared DEMO account; an invalid key is rejected.
fn authenticate(request: &Request) -> Result<String, ApiError> {
    match header(request, "x-api-key").filter(|value| !value.is_empty()) {
        None => Ok("DEMO".to_string()),
        Some(api_key) => Ok(validate::user(Some(api_key))?.to_string()),
    }
}

/// Parses the JSON body of POST and PUT requests.
fn parse_body(request: &Request) -> Result<Option<serde_json::Value>, ApiError> {
    let method = request.method();
    if method != Method::POST && method != Method::PUT {
        return Ok(None);
    }

    let path = request.uri().path();
    let content_type = header(request, "content-type").unwrap_or_default();
    if !content_type.to_lowercase().contains("application/json") {
        return Err(ApiError::bad_request(format!(
            "The {method} {path} endpoint requires application/json content"
        )));
    }

    let text = match request.body() {
        Body::Empty => "",
        Body::Text(text) => text.as_str(),
        Body::Binary(bytes) => std::str::from_utf8(bytes)
            .map_err(|err| ApiError::bad_request(format!("Error parsing JSON content. {err}")))?,
    };

    if text.trim().is_empty() {
        return Err(ApiError::bad_request("The request body is empty"));
    }

    serde_json::from_str(text)
        .map(Some)
        .map_err(|err| ApiError::bad_request(format!("Error parsing JSON content. {err}")))
}

/// Finds the first route whose pattern matches the path, then the endpoint
/// for the HTTP method. Path capture groups become handler parameters.
fn find_route(path: &str, method: &Method) -> Result<(Endpoint, Vec<String>), ApiError> {
    for route in ROUTES.iter() {
        let Some(captures) = route.pattern.captures(path) else {
            continue;
        };

        let params = captures
            .iter()
            .skip(1)
            .flatten()
            .map(|capture| capture.as_str().to_string())
            .collect();

        let endpoint = route
            .methods
            .iter()
            .find(|(allowed, _)| *allowed == method.as_str())
            .map(|(_, endpoint)| *endpoint)
            .ok_or_else(|| {
                ApiError::method_not_allowed(format!(
                    "The {path} endpoint does not allow {method}"
                ))
            })?;

        return Ok((endpoint, params));
    }

    Err(ApiError::path_not_found(format!(
        "The Super Tech Heroes API does not have a {path} endpoint"
    )))
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}
