use crate::router::RequestContext;
use lambda_http::{Body, Response};
use response::ApiError;
use serde_json::json;

/// Deletes all characters that were created by the current user.
pub async fn delete_all_characters(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let count = ctx.store.delete_all(&ctx.user).await?;

    Ok(response::ok(&json!({
        "count": count,
        "message": format!("{count} characters were deleted"),
    })))
}
