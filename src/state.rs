// FILE: src/state.rs
//! Everything one seekfs process holds: the catalog, the vector index, the
//! default-path registry, the optional query expander and the search session.
//!
//! Fetch, build and update are long-running and take `&mut self`, so a single
//! owner cannot overlap them. Search and open are quick and repeatable.

use crate::config::Config;
use crate::embedding::Embedder;
use crate::engine::{Indexer, QueryExpander, Reconciler, Retriever, SearchOutcome, SearchSession, VariantCount};
use crate::error::{Result, SeekError};
use crate::opener::Opener;
use crate::storage::default_paths::well_known_locations;
use crate::storage::{Catalog, DefaultPathRegistry, IndexStore, RegistryCommand, VectorIndex};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub struct SeekState {
    config: Config,
    store: IndexStore,
    index: VectorIndex,
    registry: DefaultPathRegistry,
    expander: Option<Box<dyn QueryExpander>>,
    session: SearchSession,
}

impl SeekState {
    /// Load all persisted structures and seed the registry with the desktop
    /// and downloads locations.
    pub fn open(
        config: Config,
        embedder: Arc<dyn Embedder>,
        expander: Option<Box<dyn QueryExpander>>,
    ) -> Result<Self> {
        Self::open_seeded(config, embedder, expander, well_known_locations())
    }

    pub fn open_seeded<I>(
        config: Config,
        embedder: Arc<dyn Embedder>,
        expander: Option<Box<dyn QueryExpander>>,
        seeds: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Option<PathBuf>)>,
    {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = IndexStore::load(config.catalog_path())?;
        let index = VectorIndex::load(embedder, &config.vector_dir(), config.embedding.batch_size)?;
        let mut registry = DefaultPathRegistry::load(config.default_paths_path())?;
        registry.seed(seeds)?;

        tracing::info!(
            "[State] Ready: {} names, vector index {}, expander {}",
            store.catalog().len(),
            if index.is_available() { "loaded" } else { "not built" },
            if expander.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            store,
            index,
            registry,
            expander,
            session: SearchSession::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// The session's names with their paths.
    pub fn session_hits(&self) -> Vec<(String, Vec<String>)> {
        self.session.with_paths(self.store.catalog())
    }

    fn roots(&self, roots: Option<&[PathBuf]>) -> Vec<PathBuf> {
        match roots {
            Some(r) if !r.is_empty() => r.to_vec(),
            _ => self.config.roots.clone(),
        }
    }

    /// Crawl the roots and replace the catalog. The vector index is untouched.
    pub fn fetch(&mut self, roots: Option<&[PathBuf]>) -> Result<usize> {
        let catalog = Indexer::crawl(&self.roots(roots))?;
        self.store.replace(catalog);
        self.store.save()?;
        let catalog = self.store.catalog();
        tracing::info!("[State] Catalog holds {} names over {} paths", catalog.len() - 1, catalog.path_count());
        Ok(catalog.len() - 1)
    }

    /// Embed every unique catalog name. With `resume`, only names the index
    /// does not hold yet are embedded.
    ///
    /// Committed batches are saved even when a later batch fails, so a
    /// `PartialBuild` can be finished with `build(true)`.
    pub fn build(&mut self, resume: bool) -> Result<usize> {
        if self.store.catalog().is_empty() {
            tracing::warn!("[State] Catalog is empty. Fetch all files first.");
            return Ok(0);
        }

        let names: Vec<String> = self.store.unique_names().into_iter().collect();
        let built = if resume && self.index.is_available() {
            let pending = self.index.pending(&names)?;
            tracing::info!("[State] Resuming build: {} of {} names pending", pending.len(), names.len());
            self.index.add_incremental(&pending)
        } else {
            self.index.build_initial(&names)
        };

        let saved = self.index.save(&self.config.vector_dir());
        let count = built?;
        saved?;
        Ok(count)
    }

    /// Re-crawl and fold the difference into both stores. Returns the added names.
    pub fn update(&mut self, roots: Option<&[PathBuf]>) -> Result<Vec<String>> {
        let fresh = Indexer::crawl(&self.roots(roots))?;
        let vector_dir = self.config.vector_dir();
        Reconciler::new(&mut self.store, &mut self.index, &vector_dir).reconcile(fresh)
    }

    /// Fuzzy search. Replaces the session.
    pub fn search(&mut self, query: &str, count: VariantCount, apps_only: bool) -> Result<SearchOutcome> {
        let outcome = Retriever::new(&self.index, self.store.catalog(), self.expander.as_deref())
            .search(query, count, apps_only)?;
        self.session = outcome.session.clone();
        Ok(outcome)
    }

    /// Exact-name search. Replaces the session.
    pub fn find(&mut self, name: &str) -> Result<SearchOutcome> {
        let outcome = Retriever::new(&self.index, self.store.catalog(), None).search_exact(name)?;
        self.session = outcome.session.clone();
        Ok(outcome)
    }

    /// Open a name from the current session. `choice` picks among several paths.
    pub fn open_name(&self, name: &str, choice: Option<usize>, opener: &dyn Opener) -> Result<PathBuf> {
        let path = PathBuf::from(self.session.resolve(self.store.catalog(), name, choice)?);
        opener.open(&path)?;
        Ok(path)
    }

    /// Open a registered default path by label.
    pub fn open_default(&self, label: &str, opener: &dyn Opener) -> Result<PathBuf> {
        let path = self
            .registry
            .lookup(label)
            .map(PathBuf::from)
            .ok_or_else(|| SeekError::NotFound(format!("'{}' is not in default paths", label)))?;
        opener.open(&path)?;
        Ok(path)
    }

    pub fn registry(&mut self, command: RegistryCommand) -> Result<BTreeMap<String, String>> {
        self.registry.apply(command)
    }
}
