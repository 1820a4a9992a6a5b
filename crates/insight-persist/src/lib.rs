pub mod dbs;
pub mod error;
pub mod memory;
pub mod trait_client;

pub use error::{PersistError, Result};
pub use memory::InMemoryStore;
pub use trait_client::{DatasetStore, QuotaStore};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
