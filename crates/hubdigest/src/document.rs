//! Loading the JSON document of expected image digests.
//!
//! The document is a list of version entries, each with a `matrix` mapping
//! product name to version string to a detail record:
//!
//! ```json
//! {"versions": [{"matrix": {"pxc": {"8.0.36": {
//!     "image_path": "percona/percona-xtradb-cluster:8.0.36",
//!     "image_hash": "4f0b...",
//!     "image_hash_arm64": "9c1d..."
//! }}}}]}
//! ```
//!
//! Object keys are kept in the order they appear in the file.

use camino::Utf8Path;
use hubdigest_image::Architecture;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::debug;

/// Errors while loading the document
#[derive(Error, Debug)]
pub enum LoadError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid document
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level document
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    pub versions: Vec<VersionEntry>,
}

/// One released version and its compatibility matrix
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    /// Product name to version string to detail record
    pub matrix: OrderedMap<OrderedMap<DetailRecord>>,
}

/// Image and expected digests for one product version.
///
/// Hash fields that are not strings (`null`, `false`, ...) count as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailRecord {
    /// Image reference in `repository:tag` form
    #[serde(default, deserialize_with = "string_or_none")]
    pub image_path: Option<String>,
    /// Expected amd64 digest, hex without the `sha256:` prefix
    #[serde(default, deserialize_with = "string_or_none")]
    pub image_hash: Option<String>,
    /// Expected arm64 digest, hex without the `sha256:` prefix
    #[serde(default, deserialize_with = "string_or_none")]
    pub image_hash_arm64: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl DetailRecord {
    /// Image reference as written, empty when the record has none
    pub fn image(&self) -> &str {
        self.image_path.as_deref().unwrap_or_default()
    }

    /// Expected digests that are present and non-empty, amd64 first
    pub fn expected_digests(&self) -> impl Iterator<Item = (Architecture, &str)> {
        [
            (Architecture::Amd64, self.image_hash.as_deref()),
            (Architecture::Arm64, self.image_hash_arm64.as_deref()),
        ]
        .into_iter()
        .filter_map(|(arch, hash)| match hash {
            Some(h) if !h.is_empty() => Some((arch, h)),
            _ => None,
        })
    }
}

/// JSON object read as a list of entries in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl ManifestDocument {
    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse the document at `path`
    pub fn load(path: &Utf8Path) -> Result<Self, LoadError> {
        debug!("Loading image document from {}", path);

        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;

        let document = Self::from_json(&content).map_err(|source| LoadError::Parse {
            path: path.to_string(),
            source,
        })?;

        debug!("Loaded {} version entries", document.versions.len());
        Ok(document)
    }
}
