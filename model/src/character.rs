//! The Character entity: construction from raw payloads or persisted
//! records, relation resolution, validation, and the two projections
//! (database model and REST resource).

use crate::validate;
use regex::Regex;
use response::ApiError;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// The allowed character types.
pub const CHARACTER_TYPES: [&str; 3] = ["hero", "sidekick", "villain"];

static RELATION_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/characters/([a-z0-9]+)$").expect("valid regex"));

/// A raw character payload, as submitted by a client or embedded in another
/// character's `sidekick`/`nemesis` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharacterInput {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "normalizedName")]
    pub normalized_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub powers: Option<Vec<String>>,
    pub weakness: Option<String>,
    pub bio: Option<String>,
    pub user: Option<String>,
    pub expires: Option<i64>,
    pub sidekick: Option<RelationRef>,
    pub nemesis: Option<RelationRef>,
}

/// The three shapes a `sidekick`/`nemesis` field can take: a nested
/// character object, a string (an ID or a URL), or something invalid.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelationRef {
    Object(Box<CharacterInput>),
    Text(String),
    Other(serde_json::Value),
}

/// Which optional field groups [`Character::validate`] should require.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Require the fields that only database models need.
    pub model: bool,
    /// Require the fields that only REST resources need.
    pub resource: bool,
}

/// A single character. Fields are optional until validated, because a
/// character can be constructed from partial data (a bare ID reference, a
/// URL slug) and filled in later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Character {
    pub id: Option<String>,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub kind: Option<String>,
    pub powers: Vec<String>,
    pub weakness: Option<String>,
    pub bio: Option<String>,
    pub user: Option<String>,
    pub expires: Option<i64>,
    pub sidekick: Option<Box<Character>>,
    pub nemesis: Option<Box<Character>>,
}

/// The flat record layout that gets persisted. Relations are bare ID
/// strings, not nested objects.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterModel {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub kind: String,
    pub user: String,
    pub expires: i64,
    pub powers: Vec<String>,
    pub weakness: Option<String>,
    pub bio: Option<String>,
    pub sidekick: Option<String>,
    pub nemesis: Option<String>,
}

/// The hypermedia projection returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterResource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weakness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub links: ResourceLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidekick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nemesis: Option<String>,
}

impl Character {
    /// Builds a character from a raw payload, resolving the `sidekick` and
    /// `nemesis` fields into (possibly partial) characters of their own.
    pub fn new(input: CharacterInput) -> Result<Character, ApiError> {
        let CharacterInput {
            id,
            name,
            normalized_name,
            kind,
            powers,
            weakness,
            bio,
            user,
            expires,
            sidekick,
            nemesis,
        } = input;

        let sidekick = sidekick
            .map(|relation| Character::from_relation(relation, "sidekick"))
            .transpose()?
            .map(Box::new);
        let nemesis = nemesis
            .map(|relation| Character::from_relation(relation, "villain"))
            .transpose()?
            .map(Box::new);

        Ok(Character {
            id,
            name,
            normalized_name,
            kind,
            powers: powers.unwrap_or_default(),
            weakness,
            bio,
            user,
            expires,
            sidekick,
            nemesis,
        })
    }

    /// Builds a character from a hierarchy payload (a hero plus optional
    /// sidekick and/or nemesis). A payload that is itself a sidekick or
    /// villain is constructed directly; anything else is treated as a hero.
    pub fn from_hierarchy(mut input: CharacterInput) -> Result<Character, ApiError> {
        match input.kind.as_deref() {
            Some("sidekick") | Some("villain") => Character::new(input),
            _ => {
                if input.kind.is_none() {
                    input.kind = Some("hero".to_string());
                }
                Character::new(input)
            }
        }
    }

    /// Resolves a `sidekick`/`nemesis` value, which may be a nested object,
    /// an existing character's ID, or a character URL. The given `kind` is a
    /// default; a nested object's own `type` wins and is checked later by
    /// [`Character::validate`].
    fn from_relation(value: RelationRef, kind: &str) -> Result<Character, ApiError> {
        match value {
            RelationRef::Object(mut input) => {
                if input.kind.is_none() {
                    input.kind = Some(kind.to_string());
                }
                Character::new(*input)
            }
            RelationRef::Text(text) => {
                if validate::is_guid(&text) {
                    Ok(Character {
                        id: Some(text),
                        kind: Some(kind.to_string()),
                        ..Character::default()
                    })
                } else {
                    Character::from_url(&text, kind)
                }
            }
            RelationRef::Other(_) => Err(ApiError::bad_request(format!(
                "The \"{kind}\" value must be a string or object"
            ))),
        }
    }

    /// Builds a character from a URL such as
    /// `http://heroes.example.com/characters/supercoder`. Only the
    /// normalized name is set.
    fn from_url(url: &str, kind: &str) -> Result<Character, ApiError> {
        match parse_character_url(url) {
            Some(normalized_name) => Ok(Character {
                normalized_name: Some(normalized_name),
                kind: Some(kind.to_string()),
                ..Character::default()
            }),
            None => Err(ApiError::path_not_found(format!(
                "The \"{kind}\" URL is not valid"
            ))),
        }
    }

    /// Reconstructs a character from a persisted record. Relations come
    /// back as ID-only references until populated.
    pub fn from_model(model: CharacterModel) -> Character {
        Character {
            id: Some(model.id),
            name: Some(model.name),
            normalized_name: Some(model.normalized_name),
            kind: Some(model.kind),
            powers: model.powers,
            weakness: model.weakness,
            bio: model.bio,
            user: Some(model.user),
            expires: Some(model.expires),
            sidekick: model.sidekick.map(|id| {
                Box::new(Character {
                    id: Some(id),
                    kind: Some("sidekick".to_string()),
                    ..Character::default()
                })
            }),
            nemesis: model.nemesis.map(|id| {
                Box::new(Character {
                    id: Some(id),
                    kind: Some("villain".to_string()),
                    ..Character::default()
                })
            }),
        }
    }

    /// A lookup reference that carries only a normalized name.
    pub fn by_normalized_name(slug: impl Into<String>) -> Character {
        Character {
            normalized_name: Some(slug.into()),
            ..Character::default()
        }
    }

    pub fn is_hero(&self) -> bool {
        self.kind.as_deref() == Some("hero")
    }

    /// Fails with a BAD_REQUEST naming the offending field if anything is
    /// invalid.
    pub fn validate(&self, opts: ValidateOptions) -> Result<(), ApiError> {
        // Unsaved characters have no ID yet; models always do
        if opts.model || self.id.is_some() {
            validate::guid("id", self.id.as_deref())?;
        }

        let name = validate::non_empty_string("name", self.name.as_deref())?;
        validate::max_length("name", name, 50)?;

        let kind = validate::non_empty_string("type", self.kind.as_deref())?;
        validate::one_of("type", kind, &CHARACTER_TYPES)?;

        for (index, power) in self.powers.iter().enumerate() {
            let field = format!("powers[{index}]");
            validate::non_empty_string(&field, Some(power))?;
            validate::max_length(&field, power, 50)?;
        }

        if let Some(weakness) = &self.weakness {
            validate::non_empty_string("weakness", Some(weakness))?;
            validate::max_length("weakness", weakness, 50)?;
        }

        if let Some(bio) = &self.bio {
            validate::non_empty_string("bio", Some(bio))?;
            validate::max_length("bio", bio, 1000)?;
        }

        if let Some(sidekick) = &self.sidekick {
            if kind != "hero" {
                return Err(ApiError::bad_request("Only heroes can have sidekicks"));
            }
            if sidekick.kind.as_deref() != Some("sidekick") {
                return Err(ApiError::bad_request(
                    "The \"sidekick.type\" value must be \"sidekick\"",
                ));
            }
        }

        if let Some(nemesis) = &self.nemesis {
            if kind != "hero" {
                return Err(ApiError::bad_request("Only heroes can have nemesis"));
            }
            if nemesis.kind.as_deref() != Some("villain") {
                return Err(ApiError::bad_request(
                    "The \"nemesis.type\" value must be \"villain\"",
                ));
            }
        }

        if opts.model {
            let normalized = validate::non_empty_string(
                "normalizedName",
                self.normalized_name.as_deref(),
            )?;
            validate::max_length("normalizedName", normalized, 50)?;
            validate::user(self.user.as_deref())?;
            validate::positive_integer("expires", self.expires)?;

            if let Some(sidekick) = &self.sidekick {
                validate::guid("sidekick.id", sidekick.id.as_deref())?;
            }
            if let Some(nemesis) = &self.nemesis {
                validate::guid("nemesis.id", nemesis.id.as_deref())?;
            }
        }

        if opts.resource {
            if let Some(sidekick) = &self.sidekick {
                validate::non_empty_string(
                    "sidekick.normalizedName",
                    sidekick.normalized_name.as_deref(),
                )?;
            }
            if let Some(nemesis) = &self.nemesis {
                validate::non_empty_string(
                    "nemesis.normalizedName",
                    nemesis.normalized_name.as_deref(),
                )?;
            }
        }

        Ok(())
    }

    /// Projects the character as a database record.
    pub fn to_model(&self) -> Result<CharacterModel, ApiError> {
        self.validate(ValidateOptions {
            model: true,
            resource: false,
        })?;

        let mut model = CharacterModel {
            id: self.id.clone().expect("id was validated"),
            name: self.name.clone().expect("name was validated"),
            normalized_name: self
                .normalized_name
                .clone()
                .expect("normalizedName was validated"),
            kind: self.kind.clone().expect("type was validated"),
            user: self.user.clone().expect("user was validated"),
            expires: self.expires.expect("expires was validated"),
            powers: self.powers.clone(),
            weakness: self.weakness.clone(),
            bio: self.bio.clone(),
            sidekick: None,
            nemesis: None,
        };

        // Relations are only persisted for heroes
        if self.is_hero() {
            model.sidekick = self.sidekick.as_ref().and_then(|s| s.id.clone());
            model.nemesis = self.nemesis.as_ref().and_then(|n| n.id.clone());
        }

        Ok(model)
    }

    /// Projects the character as a REST resource with hypermedia links.
    /// Links are relative when `host` is empty.
    pub fn to_resource(&self, host: &str) -> Result<CharacterResource, ApiError> {
        self.validate(ValidateOptions {
            model: false,
            resource: true,
        })?;

        let normalized_name = self.normalized_name.clone().unwrap_or_default();

        Ok(CharacterResource {
            name: self.name.clone().expect("name was validated"),
            kind: self.kind.clone().expect("type was validated"),
            powers: if self.powers.is_empty() {
                None
            } else {
                Some(self.powers.clone())
            },
            weakness: self.weakness.clone(),
            bio: self.bio.clone(),
            links: ResourceLinks {
                self_link: format!("{host}/characters/{normalized_name}"),
                sidekick: self.sidekick.as_ref().map(|sidekick| {
                    format!(
                        "{host}/characters/{}",
                        sidekick.normalized_name.clone().unwrap_or_default()
                    )
                }),
                nemesis: self.nemesis.as_ref().map(|nemesis| {
                    format!(
                        "{host}/characters/{}",
                        nemesis.normalized_name.clone().unwrap_or_default()
                    )
                }),
            },
        })
    }
}

/// Normalizes a character name for uniqueness checks and searches
/// (e.g. "Dr. Octocat" => "droctocat").
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Extracts the character slug from an absolute or relative URL whose path
/// looks like `/characters/{slug}`.
fn parse_character_url(url: &str) -> Option<String> {
    let path = match url.split_once("://") {
        Some((_, rest)) => {
            let slash = rest.find('/')?;
            &rest[slash..]
        }
        None => url,
    };

    // Ignore any query string or fragment
    let path = path.split(['?', '#']).next().unwrap_or(path);

    RELATION_URL_PATTERN
        .captures(path)
        .map(|captures| captures[1].to_lowercase())
}
