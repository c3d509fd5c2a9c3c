// FILE: src/storage/mod.rs
pub mod catalog;
pub mod connection;
pub mod default_paths;
pub mod record;
pub mod vec_index;

// Common exports
pub use catalog::{Catalog, IndexStore, SENTINEL};
pub use default_paths::{DefaultPathRegistry, RegistryCommand, RegistryOp};
pub use vec_index::VectorIndex;
