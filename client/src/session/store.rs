use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::ApiError;

/// Key/value persistence for the token pair.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&self, key: &str) -> Result<(), ApiError>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ApiError> {
        self.values
            .lock()
            .map_err(|_| ApiError::Storage("memory store poisoned".into()))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStore;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::SessionStore;
    use crate::error::ApiError;
    use web_sys::Storage;

    fn local_storage() -> Result<Storage, ApiError> {
        web_sys::window()
            .ok_or_else(|| ApiError::Storage("No window object".into()))?
            .local_storage()
            .map_err(|_| ApiError::Storage("No localStorage".into()))?
            .ok_or_else(|| ApiError::Storage("No localStorage".into()))
    }

    /// `window.localStorage`, scoped to the page origin.
    ///
    /// The storage handle is looked up per call; `web_sys` handles are not
    /// `Send`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BrowserStore;

    impl SessionStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
            local_storage()?
                .get_item(key)
                .map_err(|_| ApiError::Storage(format!("Failed to read {}", key)))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
            local_storage()?
                .set_item(key, value)
                .map_err(|_| ApiError::Storage(format!("Failed to store {}", key)))
        }

        fn remove(&self, key: &str) -> Result<(), ApiError> {
            local_storage()?
                .remove_item(key)
                .map_err(|_| ApiError::Storage(format!("Failed to remove {}", key)))
        }
    }

}

/// The store a browser build persists into; in-memory elsewhere.
pub fn default_store() -> Arc<dyn SessionStore> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(BrowserStore)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(MemoryStore::new())
    }
}
