mod api_info;
mod create_character;
mod delete_all_characters;
mod find_characters;
mod get_character;
mod update_character;

pub use api_info::api_info;
pub use create_character::create_character;
pub use delete_all_characters::delete_all_characters;
pub use find_characters::find_characters;
pub use get_character::get_character;
pub use update_character::update_character;

use crate::router::RequestContext;
use model::CharacterInput;
use response::ApiError;

/// Deserializes the request body as a character payload.
fn character_input(ctx: &RequestContext<'_>) -> Result<CharacterInput, ApiError> {
    let body = ctx
        .body
        .clone()
        .ok_or_else(|| ApiError::bad_request("The request body is empty"))?;

    serde_json::from_value(body)
        .map_err(|err| ApiError::bad_request(format!("Error parsing JSON content. {err}")))
}
