use crate::handlers::character_input;
use crate::router::RequestContext;
use crate::util;
use lambda_http::{Body, Response};
use model::{normalize_name, Character};
use response::ApiError;

/// Replaces a character by its normalized-name slug. The new payload's
/// sidekick/nemesis references are resolved (or created), the replacement
/// is re-keyed to the existing record's ID, re-validated, and persisted.
pub async fn update_character(ctx: &RequestContext<'_>) -> Result<Response<Body>, ApiError> {
    let slug = ctx.params.first().map(String::as_str).unwrap_or_default();

    let existing = ctx
        .store
        .find_one(&ctx.user, &Character::by_normalized_name(normalize_name(slug)))
        .await?;

    let mut character = Character::from_hierarchy(character_input(ctx)?)?;
    character.id = existing.id.clone();

    if let Some(sidekick) = character.sidekick.take() {
        let resolved = ctx.store.find_or_create(&ctx.user, *sidekick).await?;
        character.sidekick = Some(Box::new(resolved));
    }
    if let Some(nemesis) = character.nemesis.take() {
        let resolved = ctx.store.find_or_create(&ctx.user, *nemesis).await?;
        character.nemesis = Some(Box::new(resolved));
    }

    let updated = ctx.store.update(&ctx.user, character).await?;

    let host = util::get_host_name(ctx.request);
    let resource = updated.to_resource(&host)?;

    Ok(response::ok_with_location(&resource, &resource.links.self_link))
}
