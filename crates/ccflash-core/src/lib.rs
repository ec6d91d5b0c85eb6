//! Foundational low-level utilities shared across ccflash crates.
//!
//! Provides atomic file-write helpers used when the settings document is
//! rewritten mid-run, and executable discovery on `PATH` used before any
//! external toolchain is spawned.

pub mod atomic_io;
pub mod cli_executable;

pub use atomic_io::{write_bytes_atomic, write_text_atomic};
pub use cli_executable::{resolve_executable, resolve_first_executable};
