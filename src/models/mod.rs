//! Data structures persisted in the config directory or passed between layers.

pub mod credentials;
pub mod profile;
