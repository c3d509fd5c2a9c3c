//! Search session: the ordered names from the most recent search.
//!
//! Owned by whoever runs searches (one per process or request context).
//! Every search replaces it wholesale; opening a result only reads it.

use crate::error::{Result, SeekError};
use crate::storage::{Catalog, SENTINEL};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchSession {
    /// Nothing searched yet. Reads as the sentinel.
    #[default]
    Empty,
    /// Result of the last search. Never empty: no hits is `["none"]`.
    Populated(Vec<String>),
}

impl SearchSession {
    /// Session for a finished search; falls back to the sentinel when `names` is empty.
    pub fn from_results(names: Vec<String>) -> Self {
        if names.is_empty() {
            Self::Populated(vec![SENTINEL.to_string()])
        } else {
            Self::Populated(names)
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Empty => vec![SENTINEL],
            Self::Populated(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Empty => name == SENTINEL,
            Self::Populated(names) => names.iter().any(|n| n == name),
        }
    }

    /// True when the session holds only the sentinel.
    pub fn is_no_match(&self) -> bool {
        self.names() == [SENTINEL]
    }

    /// Each session name paired with its catalog paths.
    pub fn with_paths(&self, catalog: &Catalog) -> Vec<(String, Vec<String>)> {
        self.names()
            .into_iter()
            .map(|name| (name.to_string(), catalog.paths_for(name).to_vec()))
            .collect()
    }

    /// Resolve a chosen name (and optional path position) to one path.
    ///
    /// The name must come from this session; the sentinel never resolves.
    pub fn resolve<'c>(&self, catalog: &'c Catalog, name: &str, choice: Option<usize>) -> Result<&'c str> {
        if name == SENTINEL {
            return Err(SeekError::NotFound(
                "No matching file. If you are sure it exists, give a hint about where it might be".into(),
            ));
        }
        if !self.contains(name) {
            return Err(SeekError::NotFound(format!(
                "'{}' is not in the current search results ({})",
                name,
                self.names().join(", ")
            )));
        }

        let paths = catalog.paths_for(name);
        if !catalog.contains(name) || paths.is_empty() {
            return Err(SeekError::NotFound(format!("'{}' is no longer in the catalog", name)));
        }

        let idx = choice.unwrap_or(0);
        paths.get(idx).map(String::as_str).ok_or_else(|| {
            SeekError::InvalidArgument(format!(
                "'{}' has {} path(s); choice {} is out of range",
                name,
                paths.len(),
                idx
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut c = Catalog::new();
        c.push_path("report.pdf", "/c/a/report.pdf".to_string());
        c.push_path("report.pdf", "/d/b/report.pdf".to_string());
        c.push_path("chrome.exe", "/apps/chrome.exe".to_string());
        c
    }

    #[test]
    fn test_starts_empty_as_sentinel() {
        let session = SearchSession::default();
        assert_eq!(session.names(), vec!["none"]);
        assert!(session.is_no_match());
    }

    #[test]
    fn test_empty_results_fall_back_to_sentinel() {
        let session = SearchSession::from_results(Vec::new());
        assert_eq!(session, SearchSession::Populated(vec!["none".to_string()]));
        assert_eq!(
            session.with_paths(&catalog()),
            vec![("none".to_string(), vec!["none".to_string()])]
        );
    }

    #[test]
    fn test_resolve_picks_requested_path() {
        let c = catalog();
        let session = SearchSession::from_results(vec!["report.pdf".into(), "chrome.exe".into()]);
        assert_eq!(session.resolve(&c, "report.pdf", None).unwrap(), "/c/a/report.pdf");
        assert_eq!(session.resolve(&c, "report.pdf", Some(1)).unwrap(), "/d/b/report.pdf");
        assert!(matches!(
            session.resolve(&c, "report.pdf", Some(2)),
            Err(SeekError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_sentinel_and_strangers() {
        let c = catalog();
        let session = SearchSession::from_results(vec!["report.pdf".into()]);
        assert!(matches!(session.resolve(&c, "none", None), Err(SeekError::NotFound(_))));
        assert!(matches!(session.resolve(&c, "chrome.exe", None), Err(SeekError::NotFound(_))));
    }

    #[test]
    fn test_resolve_does_not_mutate() {
        let c = catalog();
        let session = SearchSession::from_results(vec!["chrome.exe".into()]);
        let before = session.clone();
        let _ = session.resolve(&c, "chrome.exe", None);
        assert_eq!(session, before);
    }
}
