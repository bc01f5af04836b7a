mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{Auth, Database, Logger, Server, Settings};
pub use storage::Storage;
