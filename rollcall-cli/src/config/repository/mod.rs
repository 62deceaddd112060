//! Repository layer for persisted session files

pub mod sessions;
