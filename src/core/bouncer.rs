// FILE: src/core/bouncer.rs
//! The Bouncer: decides which catalog names count as launchable apps.
//!
//! A launchable name is at least 4 characters long and ends in one of the
//! recognized suffixes: an executable or a shortcut to one.

const LAUNCHABLE_SUFFIXES: &[&str] = &[".exe", ".lnk"];

const MIN_LAUNCHABLE_LEN: usize = 4;

pub struct Bouncer;

impl Bouncer {
    pub fn is_launchable(name: &str) -> bool {
        if name.chars().count() < MIN_LAUNCHABLE_LEN {
            return false;
        }
        LAUNCHABLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    }
}
