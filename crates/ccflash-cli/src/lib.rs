//! CLI argument model and validation utilities for the ccflash binary.
//!
//! Exposes the clap-backed [`Cli`] plus the path helpers the pipeline uses to
//! anchor the frontend and data directories at the project root.

pub mod cli_args;
pub mod validation;

pub use cli_args::{Cli, DEFAULT_PIO_ENV};
pub use validation::*;
