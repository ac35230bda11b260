use futures::future::try_join_all;
use model::{Character, CharacterInput};
use repository::CharacterStore;
use response::ApiError;
use tracing::info;

/// The shared sandbox account. Anybody who doesn't supply an API key is
/// treated as this user, and gets sample data instead of an empty list.
pub const DEMO_USER: &str = "DEMO";

const SAMPLE_DATA: &str = include_str!("../demo-data.json");

/// Creates the sample characters for the DEMO account and returns the
/// freshly created records.
pub async fn seed(store: &CharacterStore) -> Result<Vec<Character>, ApiError> {
    let hierarchies: Vec<CharacterInput> = serde_json::from_str(SAMPLE_DATA)
        .map_err(|err| ApiError::server_error(format!("Error parsing the sample data. {err}")))?;

    info!(count = hierarchies.len(), "seeding sample data for the DEMO account");

    try_join_all(
        hierarchies
            .into_iter()
            .map(|hierarchy| store.create_hierarchy(DEMO_USER, hierarchy)),
    )
    .await?;

    store.find(DEMO_USER, None, None).await
}
