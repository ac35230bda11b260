use crate::router::RequestContext;
use crate::util;
use lambda_http::{Body, Response};
use response::ApiError;
use serde_json::json;

/// Returns information about the Super Tech Heroes API.
pub fn api_info(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let host = util::get_host_name(ctx.request);

    Ok(response::ok(&json!({
        "name": "Super Tech Heroes API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "links": {
            "characters": format!("{host}/characters"),
            "docs": "https://documenter.getpostman.com/view/super-tech-heroes-api",
        },
    })))
}
