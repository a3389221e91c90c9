//! Plate key normalization
//!
//! The recognition backend returns plate text as printed on the vehicle,
//! with whatever spacing, punctuation and casing the OCR picked up. All
//! store lookups and dashboard grouping use the canonical key instead, so
//! that `"od 02 ab 1234"` and `"OD-02-AB-1234"` refer to the same vehicle.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Canonical identifier for a vehicle license plate.
///
/// Invariant: non-empty, ASCII uppercase letters and digits only. The only
/// way to obtain one is [`PlateKey::normalize`], which enforces it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlateKey(String);

impl PlateKey {
    /// Normalize raw recognized text into a canonical plate key.
    ///
    /// Drops every character that is not an ASCII letter or digit and
    /// uppercases the rest. Returns `None` when nothing remains; callers
    /// treat that as "no plate detected". No locale-aware case folding and
    /// no tolerance for OCR confusions (`0`/`O` stay distinct).
    pub fn normalize(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// The canonical key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, yielding the canonical string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PlateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PlateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PlateKey::normalize(&raw)
            .ok_or_else(|| serde::de::Error::custom("plate key has no alphanumeric characters"))
    }
}
