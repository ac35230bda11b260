//! The narrow interface between the character store and the key-value table,
//! so the store can be tested against an in-memory implementation.

use async_trait::async_trait;
use model::CharacterModel;
use response::ApiError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// The most items a single batch write may carry (a DynamoDB limit).
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// A filtered scan over one user's characters. `id` and `normalized_name`
/// are exact matches; `name_contains` is substring containment on the
/// normalized name; `kind` is an exact type match.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    pub user: String,
    pub id: Option<String>,
    pub normalized_name: Option<String>,
    pub name_contains: Option<String>,
    pub kind: Option<String>,
}

impl ScanFilter {
    pub fn for_user(user: impl Into<String>) -> ScanFilter {
        ScanFilter {
            user: user.into(),
            ..ScanFilter::default()
        }
    }

    /// Whether the record matches every criterion in this filter.
    pub fn matches(&self, item: &CharacterModel) -> bool {
        if item.user != self.user {
            return false;
        }
        if let Some(id) = &self.id {
            if &item.id != id {
                return false;
            }
        }
        if let Some(normalized_name) = &self.normalized_name {
            if &item.normalized_name != normalized_name {
                return false;
            }
        }
        if let Some(fragment) = &self.name_contains {
            if !item.normalized_name.contains(fragment.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if &item.kind != kind {
                return false;
            }
        }
        true
    }
}

/// Key-value table access: puts, filtered scans, batched deletes, and
/// batched multi-gets by id.
#[async_trait]
pub trait CharacterTable: Send + Sync {
    /// Writes one record, replacing any record with the same id.
    async fn put(&self, item: CharacterModel) -> Result<(), ApiError>;

    /// Returns every record matching the filter.
    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<CharacterModel>, ApiError>;

    /// Deletes up to [`MAX_BATCH_WRITE_ITEMS`] records by id in one call.
    async fn batch_delete(&self, ids: &[String]) -> Result<(), ApiError>;

    /// Fetches records by id in one call. Ids that don't exist are simply
    /// absent from the result.
    async fn batch_get(&self, ids: &[String]) -> Result<Vec<CharacterModel>, ApiError>;
}

/// An in-memory [`CharacterTable`] for tests and local runs. Counts its
/// batch calls so tests can assert on batching behavior.
#[derive(Debug, Default)]
pub struct MemoryTable {
    items: Mutex<BTreeMap<String, CharacterModel>>,
    batch_delete_calls: AtomicUsize,
    batch_get_calls: AtomicUsize,
}

impl MemoryTable {
    pub fn new() -> MemoryTable {
        MemoryTable::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn batch_delete_calls(&self) -> usize {
        self.batch_delete_calls.load(Ordering::SeqCst)
    }

    pub fn batch_get_calls(&self) -> usize {
        self.batch_get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterTable for MemoryTable {
    async fn put(&self, item: CharacterModel) -> Result<(), ApiError> {
        self.items
            .lock()
            .expect("table lock poisoned")
            .insert(item.id.clone(), item);
        Ok(())
    }

    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<CharacterModel>, ApiError> {
        let items = self.items.lock().expect("table lock poisoned");
        Ok(items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn batch_delete(&self, ids: &[String]) -> Result<(), ApiError> {
        if ids.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(ApiError::server_error(format!(
                "A batch write can delete at most {MAX_BATCH_WRITE_ITEMS} items"
            )));
        }

        self.batch_delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut items = self.items.lock().expect("table lock poisoned");
        for id in ids {
            items.remove(id);
        }
        Ok(())
    }

    async fn batch_get(&self, ids: &[String]) -> Result<Vec<CharacterModel>, ApiError> {
        self.batch_get_calls.fetch_add(1, Ordering::SeqCst);

        let items = self.items.lock().expect("table lock poisoned");
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }
}
