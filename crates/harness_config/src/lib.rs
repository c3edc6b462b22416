mod errors;
pub mod settings;
pub mod storage;

pub use crate::errors::Error;

use crate::settings::{Setting, SettingInfo};
use crate::storage::MemoryStorageAdapter;
use harness_shared::types::Result;
use log::warn;
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::mem;
use std::str::FromStr;
use wildmatch::WildMatch;

/// All known settings with their defaults. They are stored in a json file, but included in the
/// binary so the harness works without any configuration on disk.
const SETTINGS_JSON: &str = include_str!("./settings.json");

/// `StorageAdapter` is the interface for storing and retrieving settings.
/// Note that we need to implement Send so the store can be moved into the async runtime.
pub trait StorageAdapter: Send + Sync {
    /// Retrieves a setting from the storage
    fn get(&self, key: &str) -> Option<Setting>;

    /// Stores a given setting to the storage
    fn set(&self, key: &str, value: Setting);

    /// Retrieves all the settings in the storage in one go. This is used for preloading the
    /// settings into the `ConfigStore`.
    fn all(&self) -> Result<HashMap<String, Setting>>;
}

/// `JsonEntry` is used for parsing the settings.json file
#[derive(Debug, Deserialize)]
struct JsonEntry {
    key: String,
    #[serde(rename = "type")]
    _entry_type: String,
    default: String,
    description: String,
}

/// Configuration storage is the place where the harness can find all configurable options.
///
/// The store is created once per run and handed to whoever needs it; there is no global
/// instance.
pub struct ConfigStore {
    /// Current value of every known setting
    settings: HashMap<String, Setting>,
    /// Descriptions, default values and type information of all settings
    settings_info: HashMap<String, SettingInfo>,
    /// Keys of all settings in declaration order
    setting_keys: Vec<String>,
    /// The storage adapter used for persisting and loading keys
    storage: Box<dyn StorageAdapter>,
}

impl ConfigStore {
    /// Creates a store with the default value for every setting and an in-memory storage
    pub fn new() -> Result<Self> {
        let mut store = Self {
            settings: HashMap::new(),
            settings_info: HashMap::new(),
            setting_keys: Vec::new(),
            storage: Box::new(MemoryStorageAdapter::new()),
        };

        store.populate_default_settings()?;
        Ok(store)
    }

    /// Sets a new storage engine and overwrites the current settings with everything the storage
    /// holds. Keys the harness does not know about and values of the wrong type are ignored.
    pub fn set_storage(&mut self, storage: Box<dyn StorageAdapter>) -> Result<()> {
        self.storage = storage;

        for (key, value) in self.storage.all()? {
            self.apply(&key, value);
        }

        Ok(())
    }

    /// Returns true when the store knows about the given key
    pub fn has(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Returns a list of keys that matches the given search string (can use ? and *) for search
    /// wildcards.
    pub fn find(&self, search: &str) -> Vec<String> {
        let search = WildMatch::new(search);

        self.setting_keys
            .iter()
            .filter(|key| search.matches(key))
            .cloned()
            .collect()
    }

    /// Retrieves information about the given key, or returns None when key is unknown
    pub fn get_info(&self, key: &str) -> Option<SettingInfo> {
        self.settings_info.get(key).cloned()
    }

    /// Returns the setting with the given key. Falls back to the storage and then to the default
    /// value. Unknown keys return None.
    pub fn get(&self, key: &str) -> Option<Setting> {
        if let Some(setting) = self.settings.get(key) {
            return Some(setting.clone());
        }

        if let Some(setting) = self.storage.get(key) {
            return Some(setting);
        }

        self.settings_info.get(key).map(|info| info.default.clone())
    }

    /// Sets the given setting to the given value and hands it to the storage. The setting MUST
    /// have a settings-info entry and the same type as its default, otherwise it is not stored.
    pub fn set(&mut self, key: &str, value: Setting) {
        if self.apply(key, value.clone()) {
            self.storage.set(key, value);
        }
    }

    fn apply(&mut self, key: &str, value: Setting) -> bool {
        let Some(info) = self.settings_info.get(key) else {
            warn!("config: Setting {key} is not known");
            return false;
        };

        if mem::discriminant(&info.default) != mem::discriminant(&value) {
            warn!("config: Setting {key} is of different type than setting expects");
            return false;
        }

        self.settings.insert(key.to_owned(), value);
        true
    }

    /// Populates the settings in the store from the settings.json file
    fn populate_default_settings(&mut self) -> Result<()> {
        let json_data: Value = serde_json::from_str(SETTINGS_JSON).map_err(Error::JsonSerde)?;

        let Value::Object(data) = json_data else {
            return Err(Error::Config("settings.json is not an object".into()).into());
        };

        for (section_prefix, section_entries) in data {
            let section_entries: Vec<JsonEntry> =
                serde_json::from_value(section_entries).map_err(Error::JsonSerde)?;

            for entry in section_entries {
                let key = format!("{}.{}", section_prefix, entry.key);

                let info = SettingInfo {
                    key: key.clone(),
                    description: entry.description,
                    default: Setting::from_str(&entry.default)?,
                };

                self.setting_keys.push(key.clone());
                self.settings.insert(key.clone(), info.default.clone());
                self.settings_info.insert(key, info);
            }
        }

        Ok(())
    }
}
