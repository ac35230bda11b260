//! The data-access layer for characters: creation, updates, lookups,
//! uniqueness enforcement, batched deletes, and relation population.

use crate::config::StoreConfig;
use crate::table::{CharacterTable, ScanFilter, MAX_BATCH_WRITE_ITEMS};
use chrono::Utc;
use futures::future;
use model::character::ValidateOptions;
use model::{normalize_name, validate, Character, CharacterInput, CHARACTER_TYPES};
use response::{ApiError, ErrorCode};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct CharacterStore {
    table: Arc<dyn CharacterTable>,
    ttl_hours: i64,
}

impl CharacterStore {
    pub fn new(table: Arc<dyn CharacterTable>, config: &StoreConfig) -> CharacterStore {
        CharacterStore {
            table,
            ttl_hours: config.ttl_hours,
        }
    }

    /// Creates a new character with a freshly assigned ID.
    pub async fn create(&self, user: &str, mut character: Character) -> Result<Character, ApiError> {
        character.id = Some(Uuid::new_v4().simple().to_string());
        self.update(user, character).await
    }

    /// Creates a top-level character and its sidekick and/or nemesis. The
    /// two relation lookups run concurrently; the top-level create only
    /// proceeds once both have succeeded.
    pub async fn create_hierarchy(
        &self,
        user: &str,
        hierarchy: CharacterInput,
    ) -> Result<Character, ApiError> {
        let mut character = Character::from_hierarchy(hierarchy)?;
        let sidekick = character.sidekick.take();
        let nemesis = character.nemesis.take();

        // If the sidekick/nemesis already exists, fetch it; otherwise create it
        let (sidekick, nemesis) = future::try_join(
            async {
                match sidekick {
                    Some(sidekick) => self.find_or_create(user, *sidekick).await.map(Some),
                    None => Ok(None),
                }
            },
            async {
                match nemesis {
                    Some(nemesis) => self.find_or_create(user, *nemesis).await.map(Some),
                    None => Ok(None),
                }
            },
        )
        .await?;

        character.sidekick = sidekick.map(Box::new);
        character.nemesis = nemesis.map(Box::new);

        self.create(user, character).await
    }

    /// Updates an existing character by its ID, re-deriving the normalized
    /// name and expiry time. Returns the in-memory character rather than
    /// re-reading it from storage.
    pub async fn update(&self, user: &str, mut character: Character) -> Result<Character, ApiError> {
        character.user = Some(user.to_string());
        character.normalized_name = character.name.as_deref().map(normalize_name);
        character.expires = Some(self.expiry_time());

        // Validate before making any table calls
        character.validate(ValidateOptions {
            model: true,
            resource: false,
        })?;

        self.ensure_unique(user, &character).await?;

        debug!(user, name = ?character.name, "persisting character");
        let item = character.to_model()?;
        self.table.put(item).await?;

        Ok(character)
    }

    /// Deletes all of the user's characters. Returns how many were deleted.
    pub async fn delete_all(&self, user: &str) -> Result<usize, ApiError> {
        let characters = self.find(user, None, None).await?;
        let count = characters.len();
        debug!(user, count, "deleting all characters");
        if count == 0 {
            return Ok(0);
        }

        let ids: Vec<String> = characters
            .into_iter()
            .filter_map(|character| character.id)
            .collect();

        future::try_join_all(
            ids.chunks(MAX_BATCH_WRITE_ITEMS)
                .map(|batch| self.table.batch_delete(batch)),
        )
        .await?;

        Ok(count)
    }

    /// Returns the character referenced by ID or normalized name, or
    /// creates it if the reference carries neither.
    pub async fn find_or_create(
        &self,
        user: &str,
        character: Character,
    ) -> Result<Character, ApiError> {
        if character.id.is_some() || character.normalized_name.is_some() {
            self.find_one(user, &character).await
        } else {
            self.create(user, character).await
        }
    }

    /// Finds a specific character by its ID or normalized name. Fails with
    /// NOT_FOUND if it doesn't exist.
    pub async fn find_one(&self, user: &str, character: &Character) -> Result<Character, ApiError> {
        let mut filter = ScanFilter::for_user(user);

        if let Some(id) = character.id.as_deref() {
            validate::guid("id", Some(id))?;
            filter.id = Some(id.to_string());
        } else {
            let normalized_name =
                validate::non_empty_string("normalizedName", character.normalized_name.as_deref())?;
            filter.normalized_name = Some(normalized_name.to_string());
        }

        let items = self.table.scan(&filter).await?;

        match items.into_iter().next() {
            Some(item) => Ok(Character::from_model(item)),
            None => {
                let reference = character
                    .id
                    .as_deref()
                    .or(character.normalized_name.as_deref())
                    .unwrap_or_default();
                Err(ApiError::resource_not_found(format!(
                    "Character \"{reference}\" does not exist"
                )))
            }
        }
    }

    /// Finds all of the user's characters, optionally filtered by a name
    /// fragment and/or an exact type. The result is unsorted and relations
    /// are not populated.
    pub async fn find(
        &self,
        user: &str,
        name: Option<&str>,
        kind: Option<&str>,
    ) -> Result<Vec<Character>, ApiError> {
        let mut filter = ScanFilter::for_user(user);

        if let Some(name) = name {
            validate::non_empty_string("name", Some(name))?;
            filter.name_contains = Some(normalize_name(name));
        }

        if let Some(kind) = kind {
            validate::one_of("type", kind, &CHARACTER_TYPES)?;
            filter.kind = Some(kind.to_string());
        }

        let items = self.table.scan(&filter).await?;
        Ok(items.into_iter().map(Character::from_model).collect())
    }

    /// Populates the sidekick/nemesis references of every character in the
    /// batch. References are satisfied from the batch itself where
    /// possible; the rest are fetched in a single batched multi-get. One
    /// fetched character may satisfy many references.
    pub async fn populate_relations(
        &self,
        mut characters: Vec<Character>,
    ) -> Result<Vec<Character>, ApiError> {
        let snapshot = characters.clone();
        let mut missing: Vec<String> = Vec::new();

        for character in &mut characters {
            for relation in [&mut character.sidekick, &mut character.nemesis] {
                let Some(relation) = relation else { continue };
                if relation.normalized_name.is_some() {
                    continue;
                }

                // The reference was constructed from a bare ID, so it needs
                // to be resolved, preferably from the batch itself
                let Some(id) = relation.id.clone() else { continue };
                match snapshot
                    .iter()
                    .find(|other| other.id.as_deref() == Some(id.as_str()))
                {
                    Some(found) => **relation = found.clone(),
                    None => missing.push(id),
                }
            }
        }

        // The table rejects duplicate keys in one multi-get
        missing.sort();
        missing.dedup();

        if !missing.is_empty() {
            for item in self.table.batch_get(&missing).await? {
                let related = Character::from_model(item);

                for character in &mut characters {
                    if let Some(sidekick) = &mut character.sidekick {
                        if sidekick.id == related.id {
                            *sidekick = Box::new(related.clone());
                        }
                    }
                    if let Some(nemesis) = &mut character.nemesis {
                        if nemesis.id == related.id {
                            *nemesis = Box::new(related.clone());
                        }
                    }
                }
            }
        }

        Ok(characters)
    }

    /// Fails with CONFLICT if another character already uses this
    /// character's normalized name.
    ///
    /// This check is not transactional: a concurrent writer could create a
    /// colliding record between this scan and the subsequent put.
    async fn ensure_unique(&self, user: &str, character: &Character) -> Result<(), ApiError> {
        let probe =
            Character::by_normalized_name(character.normalized_name.clone().unwrap_or_default());

        match self.find_one(user, &probe).await {
            Ok(existing) => {
                if existing.id == character.id {
                    return Ok(());
                }

                let name = character.name.clone().unwrap_or_default();
                let existing_name = existing.name.clone().unwrap_or_default();

                if existing_name.trim().to_lowercase() == name.trim().to_lowercase() {
                    Err(ApiError::conflict(format!(
                        "There is already another character named {name}"
                    )))
                } else {
                    Err(ApiError::conflict(format!(
                        "\"{name}\" is too similar to another character's name ({existing_name})"
                    )))
                }
            }
            Err(err) if err.code == ErrorCode::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// The Unix epoch time at which records written now will expire.
    fn expiry_time(&self) -> i64 {
        Utc::now().timestamp() + self.ttl_hours * 3600
    }
}
