//! Manifest codec: the `Key: Value` text file holding a component's properties.
//! 零件屬性檔（MANIFEST）的解析與序列化。

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::util::write_atomic;

pub const CATEGORY_KEY: &str = "Category";
pub const SUB_CATEGORY_KEY: &str = "Sub-Category";
pub const PACKAGE_KEY: &str = "Package";
pub const VALUE_KEY: &str = "Value";

static LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9\-]+): (.+)$").expect("valid manifest line regex"));
static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid property key regex"));

/// Insertion-ordered property collection of a component.
/// 依插入順序保存的零件屬性集合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(IndexMap<String, String>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts or replaces a property after validating it.
    /// 驗證後新增或取代屬性；回傳舊值。
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> StoreResult<Option<String>> {
        let key = key.into();
        let mut value = value.into();
        value.truncate(value.trim_end().len());
        if !KEY_PATTERN.is_match(&key) {
            return Err(StoreError::InvalidProperty {
                key,
                reason: "keys may only contain letters, digits and '-'".into(),
            });
        }
        if value.contains(['\n', '\r']) {
            return Err(StoreError::InvalidProperty {
                key,
                reason: "values cannot span multiple lines".into(),
            });
        }
        if value.is_empty() {
            return Err(StoreError::InvalidProperty {
                key,
                reason: "values cannot be empty".into(),
            });
        }
        Ok(self.0.insert(key, value))
    }

    /// Removes a property, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parses manifest text. Malformed lines are logged and skipped.
/// 解析屬性檔文字；格式錯誤的行會記錄警告後略過。
pub fn parse(text: &str) -> PropertyMap {
    let mut properties = IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match LINE_PATTERN.captures(line) {
            Some(captures) => {
                properties.insert(captures[1].to_string(), captures[2].to_string());
            }
            None => warn!(line = %line, "invalid manifest line"),
        }
    }
    PropertyMap(properties)
}

/// Serializes properties as one `Key: Value` line per entry, in insertion order.
/// 依插入順序輸出 `Key: Value` 行。
pub fn serialize(properties: &PropertyMap) -> String {
    let mut text = String::new();
    for (key, value) in properties.iter() {
        text.push_str(key);
        text.push_str(": ");
        text.push_str(value);
        text.push('\n');
    }
    text
}

/// Reads and parses the manifest at `path`.
/// 讀取並解析指定路徑的屬性檔。
pub fn load_manifest(path: &Path) -> StoreResult<PropertyMap> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse(&text)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(StoreError::ManifestNotFound(path.to_path_buf()))
        }
        Err(err) => Err(StoreError::io(path, err)),
    }
}

pub fn save_manifest(path: &Path, properties: &PropertyMap) -> StoreResult<()> {
    write_atomic(path, serialize(properties).as_bytes()).map_err(|err| StoreError::io(path, err))
}
