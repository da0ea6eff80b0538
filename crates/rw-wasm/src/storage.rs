//! Last used agent, persisted in the page's `localStorage`.

use rw_core::AgentId;
use rw_editor::PreferenceStore;
use web_sys::Storage;

pub struct LocalStoragePreferences {
    key: String,
}

impl LocalStoragePreferences {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl PreferenceStore for LocalStoragePreferences {
    fn last_agent(&self) -> Option<AgentId> {
        let value = Self::storage()?.get_item(&self.key).ok().flatten()?;
        (!value.is_empty()).then(|| AgentId::new(value))
    }

    fn save_last_agent(&mut self, agent: &AgentId) {
        let saved = Self::storage().map(|s| s.set_item(&self.key, agent.as_str()));
        if !matches!(saved, Some(Ok(()))) {
            log::warn!("could not persist the chosen agent");
        }
    }
}
