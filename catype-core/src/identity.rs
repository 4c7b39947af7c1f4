//! Identity types for catalog content

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque reference to a piece of catalog content.
///
/// The link id is an encoded value owned by the [`ReferenceConverter`]; only
/// the converter knows how to read the structural kind and object id out of
/// it. Two references are equal when their link ids are equal, and since the
/// kind is part of the encoding this is equality by kind and object id.
///
/// [`ReferenceConverter`]: crate::traits::ReferenceConverter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentReference(i64);

impl ContentReference {
    /// Wrap an encoded link id.
    pub const fn new(link_id: i64) -> Self {
        Self(link_id)
    }

    /// The encoded link id.
    pub const fn link_id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentReference {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for ContentReference {
    fn from(link_id: i64) -> Self {
        Self(link_id)
    }
}

/// Structural kind of a catalog content reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A catalog root. Always resolves to the well-known catalog type.
    Catalog,
    /// A catalog node (category).
    Node,
    /// A catalog entry (product, variation, bundle, package).
    Entry,
}

impl ContentKind {
    /// Stable lowercase tag, used in cache keys and snapshot files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Catalog => "catalog",
            ContentKind::Node => "node",
            ContentKind::Entry => "entry",
        }
    }

    /// Whether references of this kind need a backing-store round trip.
    pub fn needs_lookup(&self) -> bool {
        !matches!(self, ContentKind::Catalog)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "catalog" => Ok(ContentKind::Catalog),
            "node" | "catalog_node" => Ok(ContentKind::Node),
            "entry" | "catalog_entry" => Ok(ContentKind::Entry),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}
