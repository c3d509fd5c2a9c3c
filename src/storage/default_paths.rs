//! Default paths: user-curated shortcuts from a label (app or directory)
//! to its canonical path. Every mutation is persisted immediately.

use crate::error::{Result, SeekError};
use crate::storage::record::{read_record, write_record};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

const RECORD_KIND: &str = "default_paths";
const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    Get,
    Add,
    Modify,
    Delete,
}

const OPERATIONS: &[(&str, RegistryOp)] = &[
    ("get", RegistryOp::Get),
    ("add", RegistryOp::Add),
    ("modify", RegistryOp::Modify),
    ("delete", RegistryOp::Delete),
];

impl FromStr for RegistryOp {
    type Err = SeekError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        OPERATIONS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, op)| *op)
            .ok_or_else(|| {
                let known: Vec<&str> = OPERATIONS.iter().map(|(n, _)| *n).collect();
                SeekError::InvalidArgument(format!(
                    "Unknown default-paths operation '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for RegistryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = OPERATIONS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(n, _)| *n)
            .unwrap_or("?");
        f.write_str(name)
    }
}

/// A validated registry request. Construction checks that the arguments the
/// operation needs are present, so `apply` never sees a half-formed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCommand {
    Get,
    Add { name: String, path: String },
    Modify { name: String, path: String },
    Delete { name: String },
}

impl RegistryCommand {
    pub fn new(op: &str, name: Option<&str>, path: Option<&str>) -> Result<Self> {
        let op: RegistryOp = op.parse()?;
        let name = non_blank(name);
        let path = non_blank(path);

        match op {
            RegistryOp::Get => Ok(Self::Get),
            RegistryOp::Add | RegistryOp::Modify => {
                let name = name.ok_or_else(|| SeekError::InvalidArgument("App name is not given".into()))?;
                let path = path.ok_or_else(|| SeekError::InvalidArgument("Path is not given".into()))?;
                Ok(if op == RegistryOp::Add {
                    Self::Add { name, path }
                } else {
                    Self::Modify { name, path }
                })
            }
            RegistryOp::Delete => {
                let name = name.ok_or_else(|| SeekError::InvalidArgument("App name is not given".into()))?;
                Ok(Self::Delete { name })
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Lexical cleanup: drops `.` segments and redundant separators.
fn normalize(path: &str) -> String {
    let cleaned: PathBuf = Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        path.to_string()
    } else {
        cleaned.to_string_lossy().to_string()
    }
}

pub struct DefaultPathRegistry {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DefaultPathRegistry {
    /// Load the registry persisted at `path`; empty when the file is absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_record(&path, RECORD_KIND, RECORD_VERSION)?.unwrap_or_default();
        Ok(Self { path, entries })
    }

    /// Add well-known locations that are not registered yet, then persist.
    /// Candidates without a value are ignored. Safe to call on every start.
    pub fn seed<I>(&mut self, candidates: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, Option<PathBuf>)>,
    {
        let mut added = 0;
        for (label, location) in candidates {
            let Some(location) = location else { continue };
            if !self.entries.contains_key(&label) {
                tracing::info!("[Registry] Seeding {} -> {}", label, location.display());
                self.entries.insert(label, location.to_string_lossy().to_string());
                added += 1;
            }
        }
        self.save()?;
        Ok(added)
    }

    pub fn get(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn add(&mut self, name: Option<&str>, path: Option<&str>) -> Result<()> {
        self.apply(RegistryCommand::new("add", name, path)?).map(|_| ())
    }

    pub fn modify(&mut self, name: Option<&str>, path: Option<&str>) -> Result<()> {
        self.apply(RegistryCommand::new("modify", name, path)?).map(|_| ())
    }

    pub fn delete(&mut self, name: Option<&str>) -> Result<()> {
        self.apply(RegistryCommand::new("delete", name, None)?).map(|_| ())
    }

    /// Run a validated command. Returns the snapshot after the operation.
    pub fn apply(&mut self, command: RegistryCommand) -> Result<BTreeMap<String, String>> {
        match command {
            RegistryCommand::Get => {}
            RegistryCommand::Add { name, path } | RegistryCommand::Modify { name, path } => {
                let path = normalize(&path);
                tracing::info!("[Registry] {} -> {}", name, path);
                self.entries.insert(name, path);
                self.save()?;
            }
            RegistryCommand::Delete { name } => {
                if self.entries.remove(&name).is_none() {
                    return Err(SeekError::NotFound(format!("'{}' is not in default paths", name)));
                }
                tracing::info!("[Registry] Deleted {}", name);
                self.save()?;
            }
        }
        Ok(self.get())
    }

    fn save(&self) -> Result<()> {
        write_record(&self.path, RECORD_KIND, RECORD_VERSION, &self.entries)
    }
}

/// Well-known directories offered to `seed`: the `DESKTOP` / `DOWNLOADS`
/// environment variables, falling back to the platform locations.
pub fn well_known_locations() -> Vec<(String, Option<PathBuf>)> {
    let from_env = |var: &str| std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from);
    vec![
        ("desktop".to_string(), from_env("DESKTOP").or_else(dirs::desktop_dir)),
        ("downloads".to_string(), from_env("DOWNLOADS").or_else(dirs::download_dir)),
    ]
}
