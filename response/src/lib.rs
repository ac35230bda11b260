use lambda_http::{
    http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, LOCATION},
    http::StatusCode,
    Body, Response,
};
use serde::Serialize;
use serde_json::json;
use std::env;

/// Machine-readable error codes, as they appear in the `error` field of
/// error response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    BadPath,
    NotFound,
    BadMethod,
    Conflict,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::BadPath => "BAD_PATH",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BadMethod => "BAD_METHOD",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::ServerError => "SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::BadPath | ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadMethod => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A typed failure that maps directly onto an HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> ApiError {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// The URL path itself could not be found, as opposed to a path with an
    /// ID that can't be found in the database.
    pub fn path_not_found(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::BadPath, message)
    }

    pub fn resource_not_found(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::BadMethod, message)
    }

    pub fn conflict(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn server_error(message: impl Into<String>) -> ApiError {
        ApiError::new(ErrorCode::ServerError, message)
    }
}

pub fn ok<T>(body: &T) -> Response<Body>
where
    T: Serialize,
{
    json_response(StatusCode::OK, body, None)
}

pub fn ok_with_location<T>(body: &T, location: &str) -> Response<Body>
where
    T: Serialize,
{
    json_response(StatusCode::OK, body, Some(location))
}

pub fn created<T>(body: &T, location: &str) -> Response<Body>
where
    T: Serialize,
{
    json_response(StatusCode::CREATED, body, Some(location))
}

/// Renders an [`ApiError`] as a uniform `{error, message}` body. Server
/// error detail is only surfaced in development and test modes.
pub fn error(err: &ApiError) -> Response<Body> {
    let message = if err.code == ErrorCode::ServerError && !is_dev_mode() {
        "An error occurred on the server"
    } else {
        err.message.as_str()
    };

    let body = json!({
        "error": err.code.as_str(),
        "message": message,
    });

    Response::builder()
        .status(err.code.status())
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::Text(body.to_string()))
        .expect("failed to render response")
}

fn json_response<T>(status: StatusCode, body: &T, location: Option<&str>) -> Response<Body>
where
    T: Serialize,
{
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    if let Some(location) = location {
        builder = builder.header(LOCATION, location);
    }

    builder
        .body(Body::Text(json!(body).to_string()))
        .expect("failed to render response")
}

fn is_dev_mode() -> bool {
    matches!(
        env::var("SUPER_TECH_HEROES_ENV").as_deref(),
        Ok("development") | Ok("test")
    )
}
