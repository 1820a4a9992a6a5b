pub mod dataset;
pub mod quota;

#[cfg(feature = "mongodb")]
pub use dataset::MongoDatasetRepository;
#[cfg(feature = "mongodb")]
pub use quota::MongoQuotaRepository;
