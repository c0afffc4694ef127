//! Utility modules for filesystem access, logging and terminal state.

pub mod fs;
pub mod logging;
pub mod terminal;
