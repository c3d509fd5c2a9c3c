// FILE: src/engine/reconciler.rs
use crate::error::Result;
use crate::storage::{Catalog, IndexStore, VectorIndex};
use std::path::Path;

/// Names present in `new` but not in `old`, in `new`'s key order.
/// Removals are not reported: the catalog only grows.
pub fn added_names(old: &Catalog, new: &Catalog) -> Vec<String> {
    new.names()
        .filter(|name| !old.contains(name))
        .map(str::to_string)
        .collect()
}

pub struct Reconciler<'a> {
    store: &'a mut IndexStore,
    index: &'a mut VectorIndex,
    vector_dir: &'a Path,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut IndexStore, index: &'a mut VectorIndex, vector_dir: &'a Path) -> Self {
        Self { store, index, vector_dir }
    }

    /// Fold a fresh crawl into the stores:
    /// 1. added = keys(fresh) - keys(current)
    /// 2. Replace the catalog wholesale and save it
    /// 3. Embed exactly `added` into the vector index
    /// 4. Save the vector index
    ///
    /// The two saves are not atomic together. If the second one fails the
    /// catalog on disk is ahead of the vectors; the error is returned as is.
    pub fn reconcile(&mut self, fresh: Catalog) -> Result<Vec<String>> {
        let added = added_names(self.store.catalog(), &fresh);
        tracing::info!("[Reconciler] {} new names", added.len());

        self.store.replace(fresh);
        self.store.save()?;

        if !self.index.is_available() {
            tracing::warn!("[Reconciler] Vector index not built; catalog updated, embedding skipped. Build the index first.");
            return Ok(added);
        }

        // Committed batches are saved even when a later batch fails.
        let embedded = if added.is_empty() { Ok(0) } else { self.index.add_incremental(&added) };
        let saved = self.index.save(self.vector_dir);

        if let Err(e) = embedded {
            tracing::error!("[Reconciler] Embedding stopped; run 'build --resume' to finish: {}", e);
            if let Err(save_err) = saved {
                tracing::error!("[Reconciler] Vector index save failed as well: {}", save_err);
            }
            return Err(e);
        }
        if let Err(e) = saved {
            tracing::error!("[Reconciler] Catalog saved but vector index save failed: {}", e);
            return Err(e);
        }
        Ok(added)
    }
}
