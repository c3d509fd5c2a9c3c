// FILE: src/engine/searcher.rs
use crate::core::Bouncer;
use crate::engine::expander::{variants_for, QueryExpander};
use crate::engine::session::SearchSession;
use crate::error::{Result, SeekError};
use crate::storage::{Catalog, VectorIndex, SENTINEL};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Neighbours fetched for an exact-name search.
pub const EXACT_K: usize = 100;

/// Matches fetched per variant: 10 when the user named the item, 30 for a task or vague name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantCount {
    #[default]
    Narrow,
    Broad,
}

impl VariantCount {
    pub fn k(self) -> usize {
        match self {
            Self::Narrow => 10,
            Self::Broad => 30,
        }
    }
}

impl TryFrom<usize> for VariantCount {
    type Error = SeekError;

    fn try_from(n: usize) -> Result<Self> {
        match n {
            10 => Ok(Self::Narrow),
            30 => Ok(Self::Broad),
            other => Err(SeekError::InvalidArgument(format!(
                "Variant count must be 10 or 30, got {}",
                other
            ))),
        }
    }
}

impl FromStr for VariantCount {
    type Err = SeekError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "narrow" => Ok(Self::Narrow),
            "broad" => Ok(Self::Broad),
            other => other
                .parse::<usize>()
                .map_err(|_| SeekError::InvalidArgument(format!("Bad variant count '{}'", other)))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for VariantCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.k())
    }
}

/// A finished search: the new session plus each name's paths.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub session: SearchSession,
    pub hits: Vec<(String, Vec<String>)>,
    /// False when the vector index has not been built; `hits` is the sentinel then.
    pub index_available: bool,
}

pub struct Retriever<'a> {
    index: &'a VectorIndex,
    catalog: &'a Catalog,
    expander: Option<&'a dyn QueryExpander>,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a VectorIndex, catalog: &'a Catalog, expander: Option<&'a dyn QueryExpander>) -> Self {
        Self { index, catalog, expander }
    }

    /// Task-style fuzzy search: expand, query per variant, merge, filter.
    pub fn search(&self, query: &str, count: VariantCount, apps_only: bool) -> Result<SearchOutcome> {
        if !self.index.is_available() {
            return Ok(self.unavailable(query));
        }

        let variants = variants_for(self.expander, query);
        let mut per_variant = Vec::with_capacity(variants.len());
        for variant in &variants {
            per_variant.push(self.index.query_text(variant, count.k())?);
        }

        let merged = merge_candidates(per_variant);
        let names = self.filter(merged, apps_only);
        tracing::info!(
            "[Retriever] '{}' ({} variants, k={}, apps_only={}) -> {} names",
            query,
            variants.len(),
            count,
            apps_only,
            names.len()
        );
        Ok(self.finish(names))
    }

    /// Direct name search: the raw name only, no expansion, no app filter.
    pub fn search_exact(&self, name: &str) -> Result<SearchOutcome> {
        if !self.index.is_available() {
            return Ok(self.unavailable(name));
        }

        let candidates = self.index.query_text(name, EXACT_K)?;
        let names = self.filter(merge_candidates(vec![candidates]), false);
        tracing::info!("[Retriever] exact '{}' -> {} names", name, names.len());
        Ok(self.finish(names))
    }

    /// Drop names the live catalog no longer has, and non-launchables when asked.
    fn filter(&self, names: Vec<String>, apps_only: bool) -> Vec<String> {
        names
            .into_iter()
            .filter(|name| name != SENTINEL && self.catalog.contains(name))
            .filter(|name| !apps_only || Bouncer::is_launchable(name))
            .collect()
    }

    fn finish(&self, names: Vec<String>) -> SearchOutcome {
        let session = SearchSession::from_results(names);
        let hits = session.with_paths(self.catalog);
        SearchOutcome { session, hits, index_available: true }
    }

    fn unavailable(&self, query: &str) -> SearchOutcome {
        tracing::warn!("[Retriever] No vector index for '{}'. Build the index first.", query);
        let session = SearchSession::from_results(Vec::new());
        let hits = session.with_paths(self.catalog);
        SearchOutcome { session, hits, index_available: false }
    }
}

/// Stable union: first occurrence across variants wins, later duplicates are dropped.
/// Scores are not compared across variants.
pub fn merge_candidates(per_variant: Vec<Vec<(String, f32)>>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for candidates in per_variant {
        for (name, _score) in candidates {
            if seen.insert(name.clone()) {
                merged.push(name);
            }
        }
    }
    merged
}
