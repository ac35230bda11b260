use crate::handlers::character_input;
use crate::router::RequestContext;
use crate::util;
use lambda_http::{Body, Response};
use response::ApiError;

/// Creates a new character. If the character is a hero, its sidekick and
/// nemesis can be created (or referenced) at the same time.
pub async fn create_character(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let hierarchy = character_input(ctx)?;

    let character = ctx.store.create_hierarchy(&ctx.user, hierarchy).await?;

    let host = util::get_host_name(ctx.request);
    let resource = character.to_resource(&host)?;

    Ok(response::created(&resource, &resource.links.self_link))
}
