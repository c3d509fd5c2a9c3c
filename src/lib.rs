//! seekfs: file catalog and incremental semantic search
//!
//! Crawls storage roots into a name -> paths catalog, keeps a vector index
//! over the unique names, and serves multi-variant searches whose results
//! form a session used to resolve later "open" requests:
//! - Indexer (crawl) and Reconciler (set-difference update) in `engine`
//! - Catalog, vector index and default paths in `storage`
//! - Retriever and SearchSession for search and open

pub mod config;
pub mod core;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod opener;
pub mod shell;
pub mod state;
pub mod storage;

pub use config::Config;
pub use embedding::{Embedder, FastEmbedder};
pub use engine::{Retriever, SearchOutcome, SearchSession, VariantCount};
pub use error::{Result, SeekError};
pub use state::SeekState;
pub use storage::{Catalog, DefaultPathRegistry, IndexStore, RegistryCommand, VectorIndex, SENTINEL};
