//! File-backed document store

use crate::error::ConfigError;
use crate::format::Format;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use topomap_core::{ConfigStore, PersistError, TopologyDocument};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "TOPOMAP_CONFIG";
/// Config file used when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "topomap.json";

/// Pick the config path: explicit, then `TOPOMAP_CONFIG`, then `topomap.json`
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    resolve_path_with(explicit, env::var_os(CONFIG_ENV))
}

fn resolve_path_with(explicit: Option<&Path>, from_env: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match from_env {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Read a document; a missing file yields the default document
///
/// # Errors
/// - `ConfigError::UnsupportedFormat` for an unknown extension
/// - `ConfigError::Io` if the file exists but cannot be read
/// - `ConfigError::Parse` if the content is not a valid document
pub fn load_document(path: &Path) -> Result<TopologyDocument, ConfigError> {
    let format = Format::from_path(path)?;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, starting empty");
            return Ok(TopologyDocument::default());
        }
        Err(err) => return Err(ConfigError::io_error(path, err)),
    };
    let document = format.decode(&content, path)?;
    tracing::debug!(path = %path.display(), nodes = document.nodes.len(), "config loaded");
    Ok(document)
}

/// Write a document through a temp file in the same directory
///
/// # Errors
/// - `ConfigError::UnsupportedFormat` for an unknown extension
/// - `ConfigError::Serialize` if encoding fails
/// - `ConfigError::Io` if the file cannot be written or replaced
pub fn save_document(path: &Path, document: &TopologyDocument) -> Result<(), ConfigError> {
    let format = Format::from_path(path)?;
    let content = format.encode(document, path)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| ConfigError::io_error(&dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| ConfigError::io_error(&dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ConfigError::io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io_error(path, e.error))?;

    tracing::debug!(path = %path.display(), nodes = document.nodes.len(), "config saved");
    Ok(())
}

/// [`ConfigStore`] backed by a JSON or YAML file
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store at `path`
    ///
    /// # Errors
    /// - `ConfigError::UnsupportedFormat` if the extension is not JSON or YAML
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        Format::from_path(&path)?;
        Ok(Self { path })
    }

    /// Store at the resolved config path
    ///
    /// # Errors
    /// - `ConfigError::UnsupportedFormat` if the extension is not JSON or YAML
    pub fn open(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::new(resolve_path(explicit))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    /// See [`load_document`]
    pub fn read(&self) -> Result<TopologyDocument, ConfigError> {
        load_document(&self.path)
    }

    /// # Errors
    /// See [`save_document`]
    pub fn write(&self, document: &TopologyDocument) -> Result<(), ConfigError> {
        save_document(&self.path, document)
    }

    /// Read another document, for replacing the current topology
    ///
    /// Unlike [`load_document`], a missing import file is an error.
    ///
    /// # Errors
    /// - `ConfigError::Io` if `source` does not exist or cannot be read
    /// - `ConfigError::Parse` if the content is not a valid document
    pub fn import(&self, source: &Path) -> Result<TopologyDocument, ConfigError> {
        if !source.exists() {
            return Err(ConfigError::io_error(
                source,
                std::io::Error::new(std::io::ErrorKind::NotFound, "import file not found"),
            ));
        }
        let document = load_document(source)?;
        tracing::info!(from = %source.display(), nodes = document.nodes.len(), "config imported");
        Ok(document)
    }

    /// Write `document` to `target`, in the format its extension names
    ///
    /// # Errors
    /// See [`save_document`]
    pub fn export(&self, document: &TopologyDocument, target: &Path) -> Result<(), ConfigError> {
        save_document(target, document)?;
        tracing::info!(to = %target.display(), nodes = document.nodes.len(), "config exported");
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&mut self) -> Result<TopologyDocument, PersistError> {
        self.read()
            .map_err(|e| PersistError::with_source(format!("loading {}", self.path.display()), e))
    }

    fn save(&mut self, document: &TopologyDocument) -> Result<(), PersistError> {
        self.write(document)
            .map_err(|e| PersistError::with_source(format!("saving {}", self.path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_path_with(Some(Path::new("site.yaml")), Some(OsString::from("env.json")));
        assert_eq!(path, PathBuf::from("site.yaml"));
    }

    #[test]
    fn env_path_before_default() {
        assert_eq!(
            resolve_path_with(None, Some(OsString::from("/etc/topomap.yml"))),
            PathBuf::from("/etc/topomap.yml")
        );
        assert_eq!(resolve_path_with(None, Some(OsString::new())), PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(resolve_path_with(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn unsupported_extension_is_rejected_up_front() {
        assert!(FileConfigStore::new("topology.ini").is_err());
    }
}
