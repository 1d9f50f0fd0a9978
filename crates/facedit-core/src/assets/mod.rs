//! Asset Management Module
//!
//! Naming, path resolution and storage for user uploads, driving assets and
//! generated outputs.

mod naming;
mod paths;
mod store;

pub use naming::{file_suffix, new_identifier, new_output_identifier, OUTPUT_EXTENSION};
pub use paths::{validate_identifier, AssetCategory, AssetPaths, MAX_IDENTIFIER_LEN};
pub use store::{AssetStore, OutputSlot, StoredAsset};
