//! Download-and-verify manager for inference model assets.
//!
//! Model wrappers declare the files they need as [`AssetDescriptor`]s, hand
//! them to a [`FetchManager`] and only proceed to load the model once
//! [`FetchManager::all_files_downloaded`] reports every file verified.

#![allow(clippy::multiple_crate_versions)]

pub mod assets;
pub mod config;
pub mod console;
pub mod error;
pub mod fetch;

pub use assets::{AssetDescriptor, AssetState, ModelFamily};
pub use error::{FetchError, Result};
pub use fetch::{FetchManager, FetchReport};
