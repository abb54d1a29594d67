//! Persistence seam
//!
//! The engine never touches the filesystem. It hands the whole document to a
//! [`ConfigStore`] after every committed change.

use crate::types::TopologyDocument;
use std::error::Error as StdError;

/// Failure reported by a [`ConfigStore`]
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct PersistError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl PersistError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error
    #[must_use]
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Supplies and persists the topology document
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    /// Read the current document
    ///
    /// # Errors
    /// Implementation-specific I/O or parse failure
    fn load(&mut self) -> Result<TopologyDocument, PersistError>;

    /// Replace the stored document
    ///
    /// # Errors
    /// Implementation-specific I/O or serialization failure
    fn save(&mut self, document: &TopologyDocument) -> Result<(), PersistError>;
}

/// Keeps the document in memory; used when no file is configured
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    document: TopologyDocument,
    saves: usize,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new(document: TopologyDocument) -> Self {
        Self { document, saves: 0 }
    }

    #[must_use]
    pub fn document(&self) -> &TopologyDocument {
        &self.document
    }

    /// Number of successful saves so far
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&mut self) -> Result<TopologyDocument, PersistError> {
        Ok(self.document.clone())
    }

    fn save(&mut self, document: &TopologyDocument) -> Result<(), PersistError> {
        self.document = document.clone();
        self.saves += 1;
        Ok(())
    }
}
