//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod record;

pub use entity::Entity;
pub use error::{DataValidationError, DomainResult};
pub use record::Record;
