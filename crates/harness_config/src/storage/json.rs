use crate::errors::Error;
use crate::settings::Setting;
use crate::StorageAdapter;
use harness_shared::types::Result;
use log::warn;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads settings from a json file that maps keys onto typed values:
///
/// ```json
/// { "runner.timeout_ms": "u:5000", "runner.binary": "s:./my-tokenizer" }
/// ```
///
/// Changes made with `set()` are kept in memory and are not written back to the file.
pub struct JsonStorageAdapter {
    path: PathBuf,
    elements: Mutex<HashMap<String, Setting>>,
}

impl TryFrom<&Path> for JsonStorageAdapter {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::Config(format!("{} is not a regular file", path.display())).into());
        }

        let adapter = JsonStorageAdapter {
            path: path.to_path_buf(),
            elements: Mutex::new(HashMap::new()),
        };
        adapter.read_file()?;

        Ok(adapter)
    }
}

impl StorageAdapter for JsonStorageAdapter {
    fn get(&self, key: &str) -> Option<Setting> {
        self.elements.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Setting) {
        self.elements.lock().insert(key.to_owned(), value);
    }

    fn all(&self) -> Result<HashMap<String, Setting>> {
        Ok(self.elements.lock().clone())
    }
}

impl JsonStorageAdapter {
    /// Read whole json file and stores the data into self.elements
    fn read_file(&self) -> Result<()> {
        let buf = fs::read_to_string(&self.path)?;
        let parsed_json: Value = serde_json::from_str(&buf).map_err(Error::JsonSerde)?;

        let Value::Object(settings) = parsed_json else {
            return Err(Error::Config(format!(
                "{} does not contain a json object",
                self.path.display()
            ))
            .into());
        };

        let mut lock = self.elements.lock();
        for (key, value) in settings {
            match serde_json::from_value(value) {
                Ok(setting) => {
                    lock.insert(key, setting);
                }
                Err(err) => {
                    warn!("problem reading setting {key} from json: {err}");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_typed_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"runner.timeout_ms": "u:250", "runner.binary": "s:tok", "broken": "x"}}"#
        )
        .unwrap();

        let adapter = JsonStorageAdapter::try_from(file.path()).unwrap();
        assert_eq!(adapter.get("runner.timeout_ms"), Some(Setting::UInt(250)));
        assert_eq!(
            adapter.get("runner.binary"),
            Some(Setting::String("tok".into()))
        );
        assert_eq!(adapter.get("broken"), None);
        assert_eq!(adapter.all().unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        assert!(JsonStorageAdapter::try_from(file.path()).is_err());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonStorageAdapter::try_from(dir.path().join("nope.json").as_path()).is_err());
        assert!(JsonStorageAdapter::try_from(dir.path()).is_err());
    }
}
