// FILE: src/engine/indexer.rs
use crate::error::{Result, SeekError};
use crate::storage::Catalog;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PROGRESS_EVERY: usize = 10_000;

pub struct Indexer;

impl Indexer {
    /// Crawl every root, in the order given, into a fresh catalog:
    /// 1. Verify the root can be listed (fatal if not)
    /// 2. Walk it, appending each file/directory path under its base name
    /// 3. Skip unreadable subdirectories and keep going
    /// 4. Write the sentinel entry last
    pub fn crawl(roots: &[PathBuf]) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        let mut total = 0usize;
        let mut skipped = 0usize;

        for root in roots {
            Self::check_root(root)?;
            tracing::info!("[Indexer] Crawling {}", root.display());

            for entry in WalkDir::new(root)
                .follow_links(false)
                .min_depth(1)
                .sort_by_file_name()
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        skipped += 1;
                        tracing::debug!("[Indexer] Skipping unreadable entry: {}", e);
                        continue;
                    }
                };

                // Paths are stored as text; one that is not valid UTF-8 would not round-trip.
                let (Some(name), Some(path)) = (entry.file_name().to_str(), entry.path().to_str()) else {
                    skipped += 1;
                    tracing::debug!("[Indexer] Skipping non-UTF-8 path: {}", entry.path().display());
                    continue;
                };
                catalog.push_path(name, path.to_string());

                total += 1;
                if total % PROGRESS_EVERY == 0 {
                    tracing::debug!("[Indexer] {} entries so far", total);
                }
            }
        }

        catalog.seal();
        tracing::info!(
            "[Indexer] Crawl complete: {} entries, {} unique names, {} skipped",
            total,
            catalog.len() - 1,
            skipped
        );
        Ok(catalog)
    }

    fn check_root(root: &Path) -> Result<()> {
        let unavailable = |source: std::io::Error| SeekError::RootUnavailable { root: root.to_path_buf(), source };
        let metadata = std::fs::metadata(root).map_err(unavailable)?;
        if !metadata.is_dir() {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }
        std::fs::read_dir(root).map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/old")).unwrap();
        fs::create_dir_all(root.join("apps")).unwrap();
        fs::write(root.join("docs/report.pdf"), "x").unwrap();
        fs::write(root.join("docs/old/report.pdf"), "x").unwrap();
        fs::write(root.join("apps/chrome.exe"), "x").unwrap();
        dir
    }

    fn path_str(p: PathBuf) -> String {
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_every_file_and_directory_is_catalogued() {
        let dir = tree();
        let root = dir.path().to_path_buf();
        let catalog = Indexer::crawl(&[root.clone()]).unwrap();

        for entry in WalkDir::new(&root).min_depth(1) {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().to_string();
            assert!(
                catalog.paths_for(&name).contains(&path_str(entry.path().to_path_buf())),
                "missing {}",
                entry.path().display()
            );
        }
        assert!(catalog.contains("docs"));
        assert!(catalog.contains("old"));
        assert_eq!(catalog.paths_for("none"), &["none".to_string()]);
    }

    #[test]
    fn test_same_name_in_two_roots_keeps_root_order() {
        let c = tempfile::tempdir().unwrap();
        let d = tempfile::tempdir().unwrap();
        fs::create_dir_all(c.path().join("a")).unwrap();
        fs::create_dir_all(d.path().join("b")).unwrap();
        fs::write(c.path().join("a/report.pdf"), "x").unwrap();
        fs::write(d.path().join("b/report.pdf"), "x").unwrap();

        let catalog = Indexer::crawl(&[c.path().to_path_buf(), d.path().to_path_buf()]).unwrap();
        assert_eq!(
            catalog.paths_for("report.pdf"),
            &[path_str(c.path().join("a/report.pdf")), path_str(d.path().join("b/report.pdf"))]
        );

        let reversed = Indexer::crawl(&[d.path().to_path_buf(), c.path().to_path_buf()]).unwrap();
        assert_eq!(reversed.paths_for("report.pdf")[0], path_str(d.path().join("b/report.pdf")));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().to_path_buf();
        let missing = dir.path().join("not-here");
        let result = Indexer::crawl(&[good, missing.clone()]);
        match result {
            Err(SeekError::RootUnavailable { root, .. }) => assert_eq!(root, missing),
            other => panic!("expected RootUnavailable, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_crawl_is_repeatable() {
        let dir = tree();
        let roots = vec![dir.path().to_path_buf()];
        assert_eq!(Indexer::crawl(&roots).unwrap(), Indexer::crawl(&roots).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tree();
        let odd = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        fs::write(&odd, "x").unwrap();

        let catalog = Indexer::crawl(&[dir.path().to_path_buf()]).unwrap();
        assert!(catalog.names().all(|name| !name.contains('\u{FFFD}')));
        for name in catalog.names().filter(|n| *n != "none") {
            for path in catalog.paths_for(name) {
                assert!(Path::new(path).exists(), "{} does not exist", path);
            }
        }
        assert!(catalog.contains("chrome.exe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = Indexer::crawl(&[dir.path().to_path_buf()]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let catalog = result.unwrap();
        assert!(catalog.contains("locked"));
        assert!(catalog.contains("chrome.exe"));
    }
}
