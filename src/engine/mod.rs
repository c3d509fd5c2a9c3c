// FILE: src/engine/mod.rs
pub mod expander;
pub mod indexer;
pub mod reconciler;
pub mod searcher;
pub mod session;

pub use expander::{ChatExpander, QueryExpander};
pub use indexer::Indexer;
pub use reconciler::{added_names, Reconciler};
pub use searcher::{Retriever, SearchOutcome, VariantCount};
pub use session::SearchSession;
