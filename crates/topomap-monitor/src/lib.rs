//! topomap monitor - periodic snapshots
//!
//! Polls a [`SnapshotSource`] on a fixed interval and hands the newest
//! [`Snapshot`](topomap_core::Snapshot) to whoever drives the engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use topomap_monitor::{Monitor, MonitorConfig, ReplaySource};
//!
//! let source = Arc::new(ReplaySource::from_file("snapshots.json".as_ref())?);
//! let mut monitor = Monitor::spawn(source, nodes, MonitorConfig::default());
//! while let Ok(snapshot) = monitor.changed().await {
//!     engine.apply_snapshot(&snapshot, chrono::Utc::now());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod monitor;
pub mod source;

pub use error::MonitorError;
pub use monitor::{Monitor, MonitorConfig, MonitorStats, DEFAULT_INTERVAL};
pub use source::{ReplaySource, SnapshotSource, StaticSource};
