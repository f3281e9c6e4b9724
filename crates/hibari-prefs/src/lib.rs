//! Display-preference persistence
//!
//! A handful of user-tweakable display settings survive across sessions.
//! The store is read once at startup and rewritten on every change;
//! everything in between is served from the in-memory copy.

#[macro_use]
extern crate tracing;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

pub use self::file::FileStore;

mod file;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Deserialise(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialise(#[from] toml::ser::Error),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The preferences a user can change about toast display
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToastPreferences {
    pub position: ToastPosition,
    pub duration_ms: u64,
    pub max_visible: usize,
}

impl Default for ToastPreferences {
    fn default() -> Self {
        Self {
            position: ToastPosition::default(),
            duration_ms: 5000,
            max_visible: 5,
        }
    }
}

/// Enum dispatch over all supported preference stores
#[enum_dispatch(StoreBackend)]
pub enum AnyStore {
    File(FileStore),
    InMemory(InMemoryStore),
    Noop(NoopStore),
}

#[enum_dispatch]
#[allow(async_fn_in_trait)] // Because of `enum_dispatch`
pub trait StoreBackend {
    async fn load(&self) -> Result<Option<ToastPreferences>>;
    async fn save(&self, preferences: &ToastPreferences) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: std::sync::Mutex<Option<ToastPreferences>>,
}

impl StoreBackend for InMemoryStore {
    async fn load(&self) -> Result<Option<ToastPreferences>> {
        Ok(*self.inner.lock().unwrap())
    }

    async fn save(&self, preferences: &ToastPreferences) -> Result<()> {
        *self.inner.lock().unwrap() = Some(*preferences);
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
pub struct NoopStore;

impl StoreBackend for NoopStore {
    async fn load(&self) -> Result<Option<ToastPreferences>> {
        Ok(None)
    }

    async fn save(&self, _preferences: &ToastPreferences) -> Result<()> {
        Ok(())
    }
}

/// Cached, write-through view over a preference store
pub struct PreferencesService {
    store: AnyStore,
    current: RwLock<ToastPreferences>,
}

impl PreferencesService {
    /// Construct the service, reading the store once
    ///
    /// A missing or unreadable store degrades to the defaults; the error is
    /// logged and swallowed since preferences are never worth failing
    /// startup over.
    pub async fn load(store: AnyStore) -> Self {
        let current = match store.load().await {
            Ok(Some(preferences)) => preferences,
            Ok(None) => ToastPreferences::default(),
            Err(error) => {
                warn!(?error, "failed to load display preferences");
                ToastPreferences::default()
            }
        };

        Self {
            store,
            current: RwLock::new(current),
        }
    }

    pub async fn toast_preferences(&self) -> ToastPreferences {
        *self.current.read().await
    }

    /// Update the preferences and write them through to the store
    ///
    /// # Errors
    ///
    /// - The store rejected the write (the in-memory copy is updated
    ///   regardless)
    pub async fn set_toast_preferences(&self, preferences: ToastPreferences) -> Result<()> {
        *self.current.write().await = preferences;
        self.store.save(&preferences).await
    }
}
