//! Vector Index over catalog names (sqlite-vec)
//!
//! One embedding per unique name:
//! - Build/extend in fixed-size batches, one transaction per batch
//! - Top-k cosine query by text or vector
//! - Explicit save/load of the whole index to a directory

use crate::embedding::Embedder;
use crate::error::{Result, SeekError};
use crate::storage::catalog::SENTINEL;
use crate::storage::connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// sqlite-vec refuses larger k in a single KNN query.
const MAX_K: usize = 4096;

const INDEX_FILE: &str = "vectors.db";

pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    /// `None` until the first batch is committed or an index is loaded.
    conn: Option<Connection>,
    batch_size: usize,
}

impl VectorIndex {
    /// An empty, unavailable index.
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self { embedder, conn: None, batch_size: batch_size.max(1) }
    }

    /// Load the index saved in `dir`. A missing index is not an error: the
    /// returned index is empty and `is_available()` reports false.
    pub fn load(embedder: Arc<dyn Embedder>, dir: &Path, batch_size: usize) -> Result<Self> {
        let mut index = Self::new(embedder, batch_size);
        let file = dir.join(INDEX_FILE);
        if !file.exists() {
            tracing::warn!("[VectorIndex] No index at {}. Build the index first.", dir.display());
            return Ok(index);
        }

        let conn = connection::restore_from(&file)?;
        let (model, dimension) = read_meta(&conn)?;
        if dimension != index.embedder.dimension() {
            return Err(SeekError::State(format!(
                "Index at {} was built with {} ({} dims) but the configured model {} produces {} dims",
                dir.display(),
                model,
                dimension,
                index.embedder.model_name(),
                index.embedder.dimension()
            )));
        }
        if model != index.embedder.model_name() {
            tracing::warn!(
                "[VectorIndex] Index built with {}, querying with {}",
                model,
                index.embedder.model_name()
            );
        }

        index.conn = Some(conn);
        tracing::info!("[VectorIndex] Loaded {} vectors from {}", index.len()?, dir.display());
        Ok(index)
    }

    /// Persist the whole index into `dir`. No-op when nothing was ever built.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let Some(conn) = self.conn.as_ref() else {
            tracing::debug!("[VectorIndex] Nothing to save");
            return Ok(());
        };
        connection::backup_to(conn, &dir.join(INDEX_FILE))?;
        tracing::info!("[VectorIndex] Saved {} vectors to {}", self.len()?, dir.display());
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    pub fn len(&self) -> Result<usize> {
        match self.conn.as_ref() {
            Some(conn) => {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM indexed_names", [], |r| r.get(0))?;
                Ok(n as usize)
            }
            None => Ok(0),
        }
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        match self.conn.as_ref() {
            Some(conn) => Ok(name_id(conn, name)?.is_some()),
            None => Ok(false),
        }
    }

    /// Names from `names` that have no vector yet, order preserved.
    pub fn pending(&self, names: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for name in names {
            if name != SENTINEL && !self.contains(name)? {
                out.push(name.clone());
            }
        }
        Ok(out)
    }

    /// Discard any existing vectors and index `names` from scratch.
    /// The sentinel is never embedded.
    ///
    /// The fresh index takes over once its first batch commits. If no batch
    /// commits, the previous index stays in place.
    pub fn build_initial(&mut self, names: &[String]) -> Result<usize> {
        let previous = self.conn.take();
        let names: Vec<String> = names.iter().filter(|n| n.as_str() != SENTINEL).cloned().collect();
        tracing::info!("[VectorIndex] Building index for {} names", names.len());

        let result = self.insert_batches(&names);
        if result.is_err() && self.conn.is_none() && previous.is_some() {
            tracing::warn!("[VectorIndex] Rebuild failed before any batch committed; keeping the previous index");
            self.conn = previous;
        }
        result
    }

    /// Embed and insert exactly `names`. Callers pass only names that are not
    /// indexed yet; a name that already has a vector is skipped.
    pub fn add_incremental(&mut self, names: &[String]) -> Result<usize> {
        if names.is_empty() {
            return Ok(0);
        }
        tracing::info!("[VectorIndex] Adding {} names", names.len());
        self.insert_batches(names)
    }

    /// Removal hook: drop the vectors for `names`. Returns how many existed.
    pub fn remove(&mut self, names: &[String]) -> Result<usize> {
        let Some(conn) = self.conn.as_mut() else {
            return Ok(0);
        };
        let tx = conn.transaction()?;
        let mut removed = 0;
        for name in names {
            if let Some(id) = name_id(&tx, name)? {
                tx.execute("DELETE FROM name_vectors WHERE rowid = ?1", params![id])?;
                tx.execute("DELETE FROM indexed_names WHERE name_id = ?1", params![id])?;
                removed += 1;
            }
        }
        tx.commit()?;
        tracing::info!("[VectorIndex] Removed {} vectors", removed);
        Ok(removed)
    }

    /// Top-k names closest to `text`. Empty when the index is unavailable.
    pub fn query_text(&self, text: &str, k: usize) -> Result<Vec<(String, f32)>> {
        if !self.is_available() {
            tracing::warn!("[VectorIndex] Query against unbuilt index. Build the index first.");
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text)?;
        self.query_vector(&vector, k)
    }

    /// Top-k names closest to `vector`, best first. Score is cosine similarity.
    pub fn query_vector(&self, vector: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(Vec::new());
        };
        let k = k.min(MAX_K);
        if k == 0 {
            return Ok(Vec::new());
        }

        let bytes: &[u8] = bytemuck::cast_slice(vector);
        let mut stmt = conn.prepare(
            "SELECT n.name, knn.distance
             FROM (SELECT rowid, distance FROM name_vectors WHERE embedding MATCH ?1 AND k = ?2) knn
             JOIN indexed_names n ON n.name_id = knn.rowid
             ORDER BY knn.distance ASC",
        )?;
        let rows = stmt.query_map(params![bytes, k as i64], |row| {
            let name: String = row.get(0)?;
            let distance: f32 = row.get(1)?;
            Ok((name, 1.0 - distance))
        })?;

        let mut results = Vec::new();
        for r in rows {
            results.push(r?);
        }
        Ok(results)
    }

    fn insert_batches(&mut self, names: &[String]) -> Result<usize> {
        let total = names.len();
        let mut committed = 0;

        for batch in names.chunks(self.batch_size) {
            let vectors = self.embedder.embed_batch(batch).map_err(|e| {
                tracing::error!("[VectorIndex] Batch failed after {}/{} names: {}", committed, total, e);
                SeekError::PartialBuild { committed, total, reason: e.to_string() }
            })?;

            let inserted = self.commit_batch(batch, &vectors).map_err(|e| SeekError::PartialBuild {
                committed,
                total,
                reason: e.to_string(),
            })?;
            committed += batch.len();
            tracing::info!(
                "[VectorIndex] Committed batch ({} new vectors, {}/{} names)",
                inserted,
                committed,
                total
            );
        }

        Ok(committed)
    }

    /// Insert one batch in a single transaction. The first batch creates the tables.
    fn commit_batch(&mut self, names: &[String], vectors: &[Vec<f32>]) -> Result<usize> {
        if self.conn.is_none() {
            let dimension = vectors.first().map(Vec::len).unwrap_or(self.embedder.dimension());
            self.conn = Some(create_index(self.embedder.model_name(), dimension)?);
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SeekError::State("Vector index not initialized".into()))?;

        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut insert_name =
                tx.prepare("INSERT INTO indexed_names (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")?;
            let mut insert_vector =
                tx.prepare("INSERT INTO name_vectors (rowid, embedding) VALUES (?1, ?2)")?;

            for (name, vector) in names.iter().zip(vectors) {
                if insert_name.execute(params![name])? == 0 {
                    tracing::debug!("[VectorIndex] '{}' already indexed, skipping", name);
                    continue;
                }
                let id = tx.last_insert_rowid();
                let bytes: &[u8] = bytemuck::cast_slice(vector);
                insert_vector.execute(params![id, bytes])?;
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

fn create_index(model: &str, dimension: usize) -> Result<Connection> {
    let conn = connection::open_in_memory()?;
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE indexed_names (
            name_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE VIRTUAL TABLE name_vectors USING vec0(
            embedding float[{dimension}] distance_metric=cosine
        );
        "#
    ))?;
    conn.execute(
        "INSERT INTO index_meta (key, value) VALUES ('model', ?1), ('dimension', ?2)",
        params![model, dimension.to_string()],
    )?;
    tracing::debug!("[VectorIndex] Created name_vectors ({} dims)", dimension);
    Ok(conn)
}

fn read_meta(conn: &Connection) -> Result<(String, usize)> {
    let get = |key: &str| -> Result<String> {
        conn.query_row("SELECT value FROM index_meta WHERE key = ?1", params![key], |r| r.get(0))
            .optional()?
            .ok_or_else(|| SeekError::State(format!("Vector index is missing '{}' metadata", key)))
    };
    let model = get("model")?;
    let dimension = get("dimension")?
        .parse::<usize>()
        .map_err(|e| SeekError::State(format!("Bad dimension in vector index: {}", e)))?;
    Ok((model, dimension))
}

fn name_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT name_id FROM indexed_names WHERE name = ?1", params![name], |r| r.get(0))
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::HashEmbedder;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unbuilt_index_is_unavailable_and_queries_empty() {
        let index = VectorIndex::new(Arc::new(HashEmbedder::new()), 10);
        assert!(!index.is_available());
        assert!(index.query_text("chrome", 10).unwrap().is_empty());
        assert_eq!(index.len().unwrap(), 0);
    }

    #[test]
    fn test_build_in_batches_and_query() {
        let embedder = Arc::new(HashEmbedder::new());
        let mut index = VectorIndex::new(embedder.clone(), 2);
        let all = names(&["chrome.exe", "notepad.exe", "report.pdf", "holiday.jpg", "none"]);

        assert_eq!(index.build_initial(&all).unwrap(), 4);
        assert_eq!(index.len().unwrap(), 4);
        assert!(!index.contains("none").unwrap());
        assert!(!embedder.seen().contains(&"none".to_string()));

        let hits = index.query_text("chrome.exe", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, "chrome.exe");
        assert!(hits[0].1 >= hits[1].1);
    }

    #[test]
    fn test_failed_batch_keeps_committed_batches() {
        let embedder = Arc::new(HashEmbedder::failing_on("c"));
        let mut index = VectorIndex::new(embedder, 2);
        let all = names(&["a", "b", "c", "d"]);

        match index.build_initial(&all) {
            Err(SeekError::PartialBuild { committed, total, .. }) => {
                assert_eq!(committed, 2);
                assert_eq!(total, 4);
            }
            other => panic!("expected PartialBuild, got {:?}", other),
        }
        assert!(index.contains("a").unwrap());
        assert!(index.contains("b").unwrap());
        assert_eq!(index.pending(&all).unwrap(), names(&["c", "d"]));
    }

    #[test]
    fn test_rebuild_failing_on_first_batch_keeps_previous_index() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::failing_on("zzz")), 2);
        index.build_initial(&names(&["a", "b"])).unwrap();

        let result = index.build_initial(&names(&["zzz", "c"]));
        assert!(matches!(result, Err(SeekError::PartialBuild { committed: 0, .. })));
        assert!(index.is_available());
        assert_eq!(index.len().unwrap(), 2);
        assert!(index.contains("a").unwrap());
    }

    #[test]
    fn test_add_incremental_embeds_exactly_given_names() {
        let embedder = Arc::new(HashEmbedder::new());
        let mut index = VectorIndex::new(embedder.clone(), 100);
        index.build_initial(&names(&["a.txt", "b.txt"])).unwrap();

        index.add_incremental(&names(&["c.txt"])).unwrap();
        assert_eq!(embedder.seen(), names(&["a.txt", "b.txt", "c.txt"]));
        assert_eq!(index.len().unwrap(), 3);
    }

    #[test]
    fn test_duplicate_name_gets_one_vector() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()), 100);
        index.build_initial(&names(&["a.txt"])).unwrap();
        index.add_incremental(&names(&["a.txt"])).unwrap();
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn test_remove_hook() {
        let mut index = VectorIndex::new(Arc::new(HashEmbedder::new()), 100);
        index.build_initial(&names(&["a.txt", "b.txt"])).unwrap();
        assert_eq!(index.remove(&names(&["a.txt", "zzz"])).unwrap(), 1);
        assert!(!index.contains("a.txt").unwrap());
        let hits = index.query_text("a.txt", 10).unwrap();
        assert_eq!(hits, vec![(String::from("b.txt"), hits[0].1)]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(HashEmbedder::new());
        let mut index = VectorIndex::new(embedder.clone(), 100);
        index.build_initial(&names(&["chrome.exe", "report.pdf"])).unwrap();
        index.save(dir.path()).unwrap();

        let loaded = VectorIndex::load(embedder, dir.path(), 100).unwrap();
        assert!(loaded.is_available());
        assert_eq!(loaded.len().unwrap(), 2);
        assert_eq!(loaded.query_text("report.pdf", 1).unwrap()[0].0, "report.pdf");
    }

    #[test]
    fn test_load_missing_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::load(Arc::new(HashEmbedder::new()), &dir.path().join("vectors"), 100).unwrap();
        assert!(!index.is_available());
    }
}
