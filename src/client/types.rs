use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of an item in the library.
///
/// The server uses integer ids, but nothing on the client side depends on
/// that, so ids are carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self::from(n),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Body of `status.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReaderStatus {
    pub is_ready: bool,
    /// Reader location as the server sees it; informational only.
    #[serde(default)]
    pub uri: Option<String>,
}

/// One entry of `list.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub title: String,
    #[serde(alias = "authorSort", default)]
    pub author_sort: String,
    /// File formats the item can be downloaded in, e.g. `EPUB`.
    #[serde(alias = "availableData", default)]
    pub available_data: Vec<String>,
}
