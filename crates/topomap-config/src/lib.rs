//! topomap config - topology documents on disk
//!
//! Loads and saves [`TopologyDocument`](topomap_core::TopologyDocument)
//! values as JSON or YAML and plugs into the core engine as a
//! [`ConfigStore`](topomap_core::ConfigStore).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod format;
pub mod store;

pub use error::ConfigError;
pub use format::Format;
pub use store::{load_document, resolve_path, save_document, FileConfigStore, CONFIG_ENV, DEFAULT_CONFIG_FILE};
