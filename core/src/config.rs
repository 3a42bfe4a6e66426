//! Schema configuration.
//!
//! A schema is a TOML document. Each filter reads its options from its own
//! namespace table, either as typed structs (`section`) or through
//! slash-separated paths (`get_bool("simplifier/random")`).
//!
//! ```toml
//! filters = ["simplifier", "contextual_ranking_filter"]
//!
//! [simplifier]
//! opencc_config = "s2t.json"
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Directories searched for data files referenced by relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataDirs {
    pub user_data_dir: Option<PathBuf>,
    pub shared_data_dir: Option<PathBuf>,
}

impl DataDirs {
    /// Resolve `relative` under `<dir>/<subdir>/`, preferring the user
    /// directory. Returns `None` when the file exists in neither.
    pub fn find(&self, subdir: &str, relative: &Path) -> Option<PathBuf> {
        [&self.user_data_dir, &self.shared_data_dir]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(subdir).join(relative))
            .find(|candidate| candidate.exists())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaConfig {
    root: toml::Table,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(root: toml::Table) -> Self {
        Self { root }
    }

    /// Parse a schema from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(Self {
            root: toml::from_str(content)?,
        })
    }

    /// Load a schema from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_toml_str(&content)
    }

    fn lookup(&self, path: &str) -> Option<&toml::Value> {
        let mut keys = path.split('/');
        let mut value = self.root.get(keys.next()?)?;
        for key in keys {
            value = value.as_table()?.get(key)?;
        }
        Some(value)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.lookup(path)?.as_bool()
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.lookup(path)?.as_integer()
    }

    pub fn get_string(&self, path: &str) -> Option<&str> {
        self.lookup(path)?.as_str()
    }

    /// String items of a list; non-string items are skipped.
    pub fn get_list(&self, path: &str) -> Option<Vec<String>> {
        let items = self.lookup(path)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Deserialize the table at `namespace` into `T`; a missing table yields
    /// `T::default()`.
    pub fn section<T>(&self, namespace: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.lookup(namespace) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|source| Error::InvalidOptions {
                    namespace: namespace.to_string(),
                    source,
                }),
            None => Ok(T::default()),
        }
    }

    /// The ordered filter list (`filters`, or `engine/filters`).
    pub fn filters(&self) -> Vec<String> {
        self.get_list("filters")
            .or_else(|| self.get_list("engine/filters"))
            .unwrap_or_default()
    }

    /// Data directories from the `[data]` table.
    pub fn data_dirs(&self) -> Result<DataDirs> {
        self.section("data")
    }
}
