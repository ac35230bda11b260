pub mod character_store;
pub mod config;
pub mod dynamo;
pub mod table;

pub use character_store::CharacterStore;
pub use config::StoreConfig;
pub use dynamo::DynamoTable;
pub use table::{CharacterTable, MemoryTable, ScanFilter};
