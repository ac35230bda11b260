use crate::router::RequestContext;
use crate::util;
use lambda_http::{Body, Response};
use model::{normalize_name, Character};
use response::ApiError;

/// Returns a single character by its normalized-name slug. The slug is
/// normalized first, so any capitalization of the name works.
pub async fn get_character(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let slug = ctx.params.first().map(String::as_str).unwrap_or_default();

    let character = ctx
        .store
        .find_one(&ctx.user, &Character::by_normalized_name(normalize_name(slug)))
        .await?;

    let characters = ctx.store.populate_relations(vec![character]).await?;
    let character = characters
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::server_error("Relation population returned an empty batch"))?;

    let host = util::get_host_name(ctx.request);
    let resource = character.to_resource(&host)?;

    Ok(response::ok_with_location(&resource, &resource.links.self_link))
}
