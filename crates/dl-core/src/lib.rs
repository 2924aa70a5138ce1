//! Core types, resource model, and scan options for dirload.
//!
//! This crate provides the foundational types shared by the scanner and the
//! CLI:
//!
//! - [`Resource`] and [`Dictionary`] for loaded content
//! - [`ScanOptions`] for describing a scan
//! - [`ConfigError`] for option validation failures
//! - Type aliases for `FxHashMap` and `FxHashSet` (faster than std for string keys)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{ScanOptions, compile_pattern};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_map_with_capacity, fx_hash_set};
pub use types::{Callable, Dictionary, Opaque, Resource, Scalar};
