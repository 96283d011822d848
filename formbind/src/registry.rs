//! Named configuration registry.
//!
//! Lets setup code declare form configurations by name and binding code
//! consume them later, decoupling the two sides. Configurations are
//! consumed on take: one registration, one bind.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::config::FormConfig;

/// Registry of named form configurations.
#[derive(Default)]
pub struct ConfigRegistry {
    configs: Mutex<HashMap<String, FormConfig>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, config: FormConfig) {
        let name = name.into();
        debug!("registering form config '{name}'");
        self.lock().insert(name, config);
    }

    /// Remove and return the configuration registered under `name`.
    pub fn take(&self, name: &str) -> Option<FormConfig> {
        self.lock().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, FormConfig>> {
        self.configs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
