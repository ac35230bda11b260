//! The DynamoDB implementation of [`CharacterTable`].

use crate::config::StoreConfig;
use crate::table::{CharacterTable, ScanFilter};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, KeysAndAttributes, WriteRequest};
use aws_sdk_dynamodb::Client;
use model::CharacterModel;
use response::ApiError;
use std::collections::HashMap;

pub struct DynamoTable {
    client: Client,
    table_name: String,
}

impl DynamoTable {
    pub fn new(shared_config: &SdkConfig, store_config: &StoreConfig) -> DynamoTable {
        DynamoTable {
            client: Client::new(shared_config),
            table_name: store_config.table_name.clone(),
        }
    }
}

#[async_trait]
impl CharacterTable for DynamoTable {
    async fn put(&self, item: CharacterModel) -> Result<(), ApiError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(&item)))
            .send()
            .await
            .map_err(|err| ApiError::server_error(format!("DynamoDB put failed: {err}")))?;

        Ok(())
    }

    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<CharacterModel>, ApiError> {
        let mut expression = "#user = :user".to_string();
        let mut names = HashMap::from([("#user".to_string(), "user".to_string())]);
        let mut values = HashMap::from([(
            ":user".to_string(),
            AttributeValue::S(filter.user.clone()),
        )]);

        if let Some(id) = &filter.id {
            expression.push_str(" and id = :id");
            values.insert(":id".to_string(), AttributeValue::S(id.clone()));
        }

        if let Some(normalized_name) = &filter.normalized_name {
            expression.push_str(" and normalizedName = :normalizedName");
            values.insert(
                ":normalizedName".to_string(),
                AttributeValue::S(normalized_name.clone()),
            );
        }

        if let Some(fragment) = &filter.name_contains {
            expression.push_str(" and contains(normalizedName, :nameContains)");
            values.insert(
                ":nameContains".to_string(),
                AttributeValue::S(fragment.clone()),
            );
        }

        if let Some(kind) = &filter.kind {
            expression.push_str(" and #type = :type");
            names.insert("#type".to_string(), "type".to_string());
            values.insert(":type".to_string(), AttributeValue::S(kind.clone()));
        }

        let output = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|err| ApiError::server_error(format!("DynamoDB scan failed: {err}")))?;

        output
            .items
            .unwrap_or_default()
            .iter()
            .map(from_item)
            .collect()
    }

    async fn batch_delete(&self, ids: &[String]) -> Result<(), ApiError> {
        let requests = ids
            .iter()
            .map(|id| {
                let delete = DeleteRequest::builder()
                    .key("id".to_string(), AttributeValue::S(id.clone()))
                    .build()
                    .map_err(|err| {
                        ApiError::server_error(format!("Invalid batch delete request: {err}"))
                    })?;
                Ok(WriteRequest::builder().delete_request(delete).build())
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        self.client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(|err| {
                ApiError::server_error(format!("DynamoDB batch write failed: {err}"))
            })?;

        Ok(())
    }

    async fn batch_get(&self, ids: &[String]) -> Result<Vec<CharacterModel>, ApiError> {
        let keys = ids
            .iter()
            .map(|id| HashMap::from([("id".to_string(), AttributeValue::S(id.clone()))]))
            .collect();

        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .build()
            .map_err(|err| {
                ApiError::server_error(format!("Invalid batch get request: {err}"))
            })?;

        let output = self
            .client
            .batch_get_item()
            .request_items(&self.table_name, keys_and_attributes)
            .send()
            .await
            .map_err(|err| ApiError::server_error(format!("DynamoDB batch get failed: {err}")))?;

        output
            .responses
            .unwrap_or_default()
            .remove(&self.table_name)
            .unwrap_or_default()
            .iter()
            .map(from_item)
            .collect()
    }
}

fn to_item(model: &CharacterModel) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        ("id".to_string(), AttributeValue::S(model.id.clone())),
        ("name".to_string(), AttributeValue::S(model.name.clone())),
        (
            "normalizedName".to_string(),
            AttributeValue::S(model.normalized_name.clone()),
        ),
        ("type".to_string(), AttributeValue::S(model.kind.clone())),
        ("user".to_string(), AttributeValue::S(model.user.clone())),
        (
            "expires".to_string(),
            AttributeValue::N(model.expires.to_string()),
        ),
    ]);

    if !model.powers.is_empty() {
        let powers = model
            .powers
            .iter()
            .map(|power| AttributeValue::S(power.clone()))
            .collect();
        item.insert("powers".to_string(), AttributeValue::L(powers));
    }
    if let Some(weakness) = &model.weakness {
        item.insert("weakness".to_string(), AttributeValue::S(weakness.clone()));
    }
    if let Some(bio) = &model.bio {
        item.insert("bio".to_string(), AttributeValue::S(bio.clone()));
    }
    if let Some(sidekick) = &model.sidekick {
        item.insert("sidekick".to_string(), AttributeValue::S(sidekick.clone()));
    }
    if let Some(nemesis) = &model.nemesis {
        item.insert("nemesis".to_string(), AttributeValue::S(nemesis.clone()));
    }

    item
}

fn from_item(item: &HashMap<String, AttributeValue>) -> Result<CharacterModel, ApiError> {
    Ok(CharacterModel {
        id: required_s(item, "id")?,
        name: required_s(item, "name")?,
        normalized_name: required_s(item, "normalizedName")?,
        kind: required_s(item, "type")?,
        user: required_s(item, "user")?,
        expires: required_n(item, "expires")?,
        powers: item
            .get("powers")
            .and_then(|attr| attr.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|attr| attr.as_s().ok().cloned())
                    .collect()
            })
            .unwrap_or_default(),
        weakness: optional_s(item, "weakness"),
        bio: optional_s(item, "bio"),
        sidekick: optional_s(item, "sidekick"),
        nemesis: optional_s(item, "nemesis"),
    })
}

fn required_s(item: &HashMap<String, AttributeValue>, key: &str) -> Result<String, ApiError> {
    item.get(key)
        .and_then(|attr| attr.as_s().ok())
        .cloned()
        .ok_or_else(|| {
            ApiError::server_error(format!(
                "The \"{key}\" attribute is missing from a character record"
            ))
        })
}

fn optional_s(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|attr| attr.as_s().ok()).cloned()
}

fn required_n(item: &HashMap<String, AttributeValue>, key: &str) -> Result<i64, ApiError> {
    item.get(key)
        .and_then(|attr| attr.as_n().ok())
        .and_then(|number| number.parse().ok())
        .ok_or_else(|| {
            ApiError::server_error(format!(
                "The \"{key}\" attribute is missing from a character record"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CharacterModel {
        CharacterModel {
            id: "46c1bb3f8af44e0f9b4c91e9a1e52d39".to_string(),
            name: "Super Coder".to_string(),
            normalized_name: "supercoder".to_string(),
            kind: "hero".to_string(),
            user: "DEMO".to_string(),
            expires: 1_700_000_000,
            powers: vec!["10x output".to_string()],
            weakness: Some("Scope creep".to_string()),
            bio: None,
            sidekick: Some("b1f0c2d3e4a5b6c7d8e9f0a1b2c3d4e5".to_string()),
            nemesis: None,
        }
    }

    #[test]
    fn item_round_trip_preserves_every_attribute() {
        let original = model();
        let restored = from_item(&to_item(&original)).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn absent_optional_attributes_stay_absent() {
        let mut original = model();
        original.powers = Vec::new();
        original.weakness = None;
        original.sidekick = None;

        let item = to_item(&original);
        assert!(!item.contains_key("powers"));
        assert!(!item.contains_key("weakness"));
        assert!(!item.contains_key("sidekick"));

        let restored = from_item(&item).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn missing_required_attributes_are_reported() {
        let mut item = to_item(&model());
        item.remove("name");

        let err = from_item(&item).unwrap_err();
        assert!(err.message.contains("\"name\" attribute is missing"));
    }
}
