//! Small key/value persistence
//!
//! Values are stored as JSON strings. On the web this is LocalStorage;
//! natively it is an in-memory map that lives as long as the process.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage is not available")]
    Unavailable,
    #[error("storage rejected the write for {0}")]
    WriteFailed(String),
}

/// Read `key`, or `None` if it is missing or does not decode
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = backend::get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring unreadable value under {key}: {e}");
            None
        }
    }
}

/// Write `value` under `key`
pub fn save<T: Serialize>(key: &str, value: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(value)?;
    backend::set(key, &json)
}

#[cfg(target_arch = "wasm32")]
mod backend {
    use super::PersistenceError;

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    pub fn get(key: &str) -> Option<String> {
        storage()?.get_item(key).ok().flatten()
    }

    pub fn set(key: &str, json: &str) -> Result<(), PersistenceError> {
        let storage = storage().ok_or(PersistenceError::Unavailable)?;
        storage
            .set_item(key, json)
            .map_err(|_| PersistenceError::WriteFailed(key.to_string()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod backend {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::PersistenceError;

    thread_local! {
        static STORE: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
    }

    pub fn get(key: &str) -> Option<String> {
        STORE.with(|store| store.borrow().get(key).cloned())
    }

    pub fn set(key: &str, json: &str) -> Result<(), PersistenceError> {
        STORE.with(|store| store.borrow_mut().insert(key.to_string(), json.to_string()));
        Ok(())
    }
}
