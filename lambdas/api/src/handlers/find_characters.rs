use crate::demo_data;
use crate::router::RequestContext;
use crate::util;
use lambda_http::{Body, RequestExt, Response};
use response::ApiError;

/// Finds all of the user's characters, optionally filtered by `name`
/// (substring) and/or `type` query criteria.
pub async fn find_characters(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let query = ctx.request.query_string_parameters();
    let name = query
        .first("name")
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let kind = query
        .first("type")
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let mut characters = ctx
        .store
        .find(&ctx.user, name.as_deref(), kind.as_deref())
        .await?;

    // The DEMO account gets sample data rather than an empty response
    if characters.is_empty()
        && ctx.user == demo_data::DEMO_USER
        && name.is_none()
        && kind.is_none()
    {
        characters = demo_data::seed(ctx.store).await?;
    }

    let mut characters = ctx.store.populate_relations(characters).await?;
    characters.sort_by(|a, b| a.name.cmp(&b.name));

    let host = util::get_host_name(ctx.request);
    let resources = characters
        .iter()
        .map(|character| character.to_resource(&host))
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(response::ok(&resources))
}
