// FILE: src/opener.rs
//! Hands a resolved path to the operating system.

use crate::error::{Result, SeekError};
use std::path::Path;
use std::process::Command;

pub trait Opener {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Opens with the platform's default handler (`start`, `open` or `xdg-open`).
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(SeekError::NotFound(format!("{} does not exist", path.display())));
        }

        let mut command = platform_command(path);
        tracing::info!("[Opener] Opening {}", path.display());
        command.spawn()?;
        Ok(())
    }
}

#[cfg(windows)]
fn platform_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn platform_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(windows, target_os = "macos")))]
fn platform_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Opener;
    use crate::error::Result;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Records every path it is asked to open.
    #[derive(Default)]
    pub struct RecordingOpener {
        opened: Mutex<Vec<PathBuf>>,
    }

    impl RecordingOpener {
        pub fn opened(&self) -> Vec<PathBuf> {
            self.opened.lock().unwrap().clone()
        }
    }

    impl Opener for RecordingOpener {
        fn open(&self, path: &Path) -> Result<()> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemOpener.open(&dir.path().join("nope.txt"));
        assert!(matches!(result, Err(SeekError::NotFound(_))));
    }
}
