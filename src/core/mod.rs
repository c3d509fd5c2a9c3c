// FILE: src/core/mod.rs
pub mod bouncer;

pub use bouncer::Bouncer;
