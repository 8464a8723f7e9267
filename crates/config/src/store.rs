// Where the encoded settings blob lives between runs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::session_config::SessionConfig;

/// Storage for one opaque settings blob.
pub trait SettingsStore {
    /// The last saved blob, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the saved blob.
    fn save(&mut self, blob: &[u8]) -> Result<()>;
}

/// Blob kept in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/parley/session_settings.bin` (platform config dir)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("parley").join("session_settings.bin"))
    }

    /// Store at the configured `settings_path`, or the platform default.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config
            .resolved_settings_path()
            .map(Self::new)
            .ok_or(Error::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    /// Write-to-temp-then-rename so a crash never leaves half a blob.
    fn save(&mut self, blob: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, blob).map_err(|e| Error::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| Error::io(&self.path, e))?;

        log::debug!("Saved {} bytes of session settings to {}", blob.len(), self.path.display());
        Ok(())
    }
}

/// In-process store, for embedding without a filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<Vec<u8>>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Some(blob),
            saves: 0,
        }
    }

    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// How many times `save` was called.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &[u8]) -> Result<()> {
        self.blob = Some(blob.to_vec());
        self.saves += 1;
        Ok(())
    }
}
