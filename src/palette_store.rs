//! Fixed embroidery thread palette.
//!
//! The palette is loaded once and never mutated afterwards, so a single
//! `PaletteStore` can be shared by reference across concurrent chart requests.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Embedded DMC thread table (code, name, RGB), used when no palette file is given.
const BUILTIN_DMC_JSON: &str = include_str!("../data/dmc.json");

pub type Rgb = [u8; 3];

/// One commercial thread colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    #[serde(rename = "floss", alias = "id")]
    pub id: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default)]
    pub description: String,
}

impl PaletteEntry {
    pub fn new(id: impl Into<String>, rgb: Rgb, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            description: description.into(),
        }
    }

    pub fn rgb(&self) -> Rgb {
        [self.r, self.g, self.b]
    }
}

/// Ordered, read-only thread palette.
#[derive(Debug, Clone)]
pub struct PaletteStore {
    entries: Vec<PaletteEntry>,
}

impl PaletteStore {
    /// Load a palette file. Any failure (missing, malformed, empty, duplicate ids)
    /// is reported as `DataUnavailable`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChartError::DataUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let store = Self::from_json(&text)?;
        log::info!(
            "Loaded {} palette entries from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<PaletteEntry> = serde_json::from_str(text)
            .map_err(|e| ChartError::DataUnavailable(format!("Malformed palette data: {}", e)))?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<PaletteEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ChartError::DataUnavailable(
                "Palette contains no entries.".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(ChartError::DataUnavailable(
                    "Palette entry with empty id.".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ChartError::DataUnavailable(format!(
                    "Duplicate palette id '{}'.",
                    entry.id
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The embedded DMC palette.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DMC_JSON)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_palette_loads_in_file_order() {
        let store = PaletteStore::builtin().expect("embedded palette should parse");
        assert!(store.len() > 100);
        assert_eq!(store.entries()[0].id, "B5200");

        let black = store.get("310").expect("310 should exist");
        assert_eq!(black.rgb(), [0, 0, 0]);
        assert_eq!(black.description, "Black");
    }

    #[test]
    fn accepts_id_alias_and_missing_description() {
        let store = PaletteStore::from_json(r#"[{"id": "A1", "r": 1, "g": 2, "b": 3}]"#)
            .expect("alias should be accepted");
        assert_eq!(store.entries()[0].id, "A1");
        assert_eq!(store.entries()[0].description, "");
    }

    #[test]
    fn empty_palette_is_unavailable() {
        let err = PaletteStore::from_json("[]").expect_err("empty palette must be rejected");
        assert!(matches!(err, ChartError::DataUnavailable(_)));
    }

    #[test]
    fn malformed_palette_is_unavailable() {
        let out_of_range = r#"[{"floss": "1", "description": "x", "r": 300, "g": 0, "b": 0}]"#;
        assert!(matches!(
            PaletteStore::from_json(out_of_range),
            Err(ChartError::DataUnavailable(_))
        ));
        assert!(matches!(
            PaletteStore::from_json("{not json"),
            Err(ChartError::DataUnavailable(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let entries = vec![
            PaletteEntry::new("310", [0, 0, 0], "Black"),
            PaletteEntry::new("310", [1, 1, 1], "Also black"),
        ];
        assert!(matches!(
            PaletteStore::from_entries(entries),
            Err(ChartError::DataUnavailable(_))
        ));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = PaletteStore::load("/definitely/not/here/rgb-dmc.json")
            .expect_err("missing file must fail");
        assert!(matches!(err, ChartError::DataUnavailable(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"floss": "310", "description": "Black", "r": 0, "g": 0, "b": 0}}]"#
        )
        .expect("write palette");

        let store = PaletteStore::load(file.path()).expect("palette should load");
        assert_eq!(store.len(), 1);
    }
}
