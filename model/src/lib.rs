pub mod character;
pub mod validate;

pub use character::{
    normalize_name, Character, CharacterInput, CharacterModel, CharacterResource, RelationRef,
    ResourceLinks, ValidateOptions, CHARACTER_TYPES,
};
