use harness_shared::types::Error;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolves executable names to paths. Each name is resolved at most once; later lookups are
/// answered from the cache. Create one locator per run and pass it to whoever spawns processes.
pub struct ExecutableLocator {
    /// Directories to search, in `PATH` format
    search_path: Option<OsString>,
    cache: Mutex<HashMap<String, PathBuf>>,
}

impl ExecutableLocator {
    /// Locator that searches the `PATH` of the current process
    pub fn from_env() -> Self {
        Self::with_search_path(env::var_os("PATH"))
    }

    pub fn with_search_path(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the path of the executable. Names that contain a directory part are used as
    /// given, bare names are looked up in the search path.
    pub fn locate(&self, name: &str) -> Result<PathBuf, Error> {
        if let Some(path) = self.cache.lock().get(name) {
            return Ok(path.clone());
        }

        let path = self.resolve(name)?;
        debug!("resolved executable {name} to {}", path.display());

        self.cache.lock().insert(name.to_string(), path.clone());
        Ok(path)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return if candidate.is_file() {
                Ok(candidate.to_path_buf())
            } else {
                Err(Error::ExecutableNotFound(name.to_string()))
            };
        }

        self.search_path
            .iter()
            .flat_map(env::split_paths)
            .map(|dir| dir.join(format!("{name}{}", env::consts::EXE_SUFFIX)))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::ExecutableNotFound(name.to_string()))
    }

    /// Number of names resolved so far
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}
