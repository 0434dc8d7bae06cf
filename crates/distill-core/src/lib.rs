//! Distill Core - Core types and domain models for the Distill knowledge pipeline.

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
