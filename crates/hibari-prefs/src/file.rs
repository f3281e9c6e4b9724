use crate::{Result, StoreBackend, ToastPreferences};
use std::path::PathBuf;
use tokio::fs;

/// Preference store backed by a single toml document
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StoreBackend for FileStore {
    async fn load(&self) -> Result<Option<ToastPreferences>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(toml::from_str(&content)?))
    }

    async fn save(&self, preferences: &ToastPreferences) -> Result<()> {
        let serialised = toml::to_string_pretty(preferences)?;
        fs::write(&self.path, serialised).await?;

        Ok(())
    }
}
