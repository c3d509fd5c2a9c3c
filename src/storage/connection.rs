//! SQLite connection management for the vector index
//!
//! The working copy of the vector index lives in an in-memory database.
//! Persistence is explicit: `backup_to` writes the whole database to a file,
//! `restore_from` reads it back.

use crate::error::{Result, SeekError};
use rusqlite::{Connection, DatabaseName};
use std::path::Path;
use std::sync::OnceLock;

static VEC_EXTENSION: OnceLock<std::os::raw::c_int> = OnceLock::new();

/// Register sqlite-vec with SQLite so every new connection gets `vec0`.
fn register_sqlite_vec_extension() -> Result<()> {
    let result = *VEC_EXTENSION.get_or_init(|| unsafe {
        // sqlite3_auto_extension expects the generic entry point signature.
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )))
    });

    if result != rusqlite::ffi::SQLITE_OK {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(result),
            Some("Failed to register sqlite-vec extension".to_string()),
        );
        return Err(SeekError::Database(err));
    }
    Ok(())
}

/// Fresh in-memory connection with sqlite-vec available.
pub fn open_in_memory() -> Result<Connection> {
    register_sqlite_vec_extension()?;
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", ON)?;
    Ok(conn)
}

/// Write the whole database behind `conn` to `path`, replacing its contents.
pub fn backup_to(conn: &Connection, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    conn.backup(DatabaseName::Main, path, None)?;
    Ok(())
}

/// Load a database file written by `backup_to` into a new in-memory connection.
pub fn restore_from(path: &Path) -> Result<Connection> {
    let mut conn = open_in_memory()?;
    conn.restore(DatabaseName::Main, path, None::<fn(rusqlite::backup::Progress)>)?;
    Ok(conn)
}

// SQL pragma constants
const ON: &str = "ON";
