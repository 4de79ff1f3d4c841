//! Deterministic symbol assignment for the colours a grid actually uses.

use crate::error::{ChartError, Result};
use crate::grid::QuantizedGrid;
use crate::matcher::ColorMatcher;
use crate::palette_store::{PaletteEntry, Rgb};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Default chart glyphs, assigned in this order.
pub const DEFAULT_SYMBOLS: &str = "123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ#@$§&?%+=*<>";

/// Fixed ordered glyph alphabet. Reused cyclically once exhausted, so
/// symbols repeat after `len()` distinct colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolAlphabet {
    glyphs: Vec<char>,
}

impl SymbolAlphabet {
    pub fn new(glyphs: &str) -> Result<Self> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.is_empty() {
            return Err(ChartError::InvalidParameter(
                "Symbol alphabet must not be empty.".to_string(),
            ));
        }
        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index % self.glyphs.len()]
    }
}

impl Default for SymbolAlphabet {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_SYMBOLS.chars().collect(),
        }
    }
}

/// A palette colour used by the grid, with its chart glyph and stitch count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedColorEntry {
    pub entry: PaletteEntry,
    pub symbol: char,
    pub count: u32,
}

/// Used colours keyed by palette id.
///
/// Iteration order is first-seen order from a row-major walk of the grid;
/// symbol assignment and legend order both follow it.
#[derive(Debug, Clone, Default)]
pub struct UsedColors {
    entries: IndexMap<String, UsedColorEntry>,
    by_rgb: HashMap<Rgb, usize>,
}

impl UsedColors {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UsedColorEntry> {
        self.entries.values()
    }

    pub fn get(&self, id: &str) -> Option<&UsedColorEntry> {
        self.entries.get(id)
    }

    /// Entry a grid cell colour resolved to during assignment.
    pub fn for_cell(&self, rgb: Rgb) -> Option<&UsedColorEntry> {
        self.by_rgb
            .get(&rgb)
            .and_then(|&idx| self.entries.get_index(idx))
            .map(|(_, entry)| entry)
    }

    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|e| e.count as u64).sum()
    }
}

/// Walk `grid` row by row and give each newly seen palette colour the next glyph.
pub fn assign(
    grid: &QuantizedGrid,
    matcher: &mut ColorMatcher<'_>,
    alphabet: &SymbolAlphabet,
) -> UsedColors {
    let mut used = UsedColors::default();

    for &rgb in grid.cells() {
        let known = used.by_rgb.get(&rgb).copied();
        let idx = match known {
            Some(idx) => idx,
            None => {
                let entry = matcher.closest(rgb);
                let idx = match used.entries.entry(entry.id.clone()) {
                    Entry::Occupied(occupied) => occupied.index(),
                    Entry::Vacant(vacant) => {
                        let idx = vacant.index();
                        vacant.insert(UsedColorEntry {
                            entry: entry.clone(),
                            symbol: alphabet.glyph(idx),
                            count: 0,
                        });
                        idx
                    }
                };
                used.by_rgb.insert(rgb, idx);
                idx
            }
        };
        used.entries[idx].count += 1;
    }

    if used.len() > alphabet.len() {
        log::warn!(
            "{} colors share an alphabet of {} symbols; symbols repeat",
            used.len(),
            alphabet.len()
        );
    }
    log::debug!(
        "Assigned {} symbols over {}x{} grid",
        used.len(),
        grid.width(),
        grid.height()
    );

    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette_store::PaletteEntry;

    fn black_white_palette() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry::new("B5200", [255, 255, 255], "Snow White"),
            PaletteEntry::new("310", [0, 0, 0], "Black"),
        ]
    }

    fn checker(size: u32, first: Rgb, second: Rgb) -> QuantizedGrid {
        let cells = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x + y) % 2 == 0 {
                    first
                } else {
                    second
                }
            })
            .collect();
        QuantizedGrid::new(size, size, cells).expect("valid grid")
    }

    #[test]
    fn default_alphabet_has_47_unique_glyphs() {
        let alphabet = SymbolAlphabet::default();
        assert_eq!(alphabet.len(), 47);
        let unique: std::collections::HashSet<char> = DEFAULT_SYMBOLS.chars().collect();
        assert_eq!(unique.len(), 47);
        assert_eq!(alphabet.glyph(0), '1');
        assert_eq!(alphabet.glyph(47), '1');
    }

    #[test]
    fn black_and_white_grid_gets_two_symbols_in_encounter_order() {
        let palette = black_white_palette();
        let grid = checker(20, [0, 0, 0], [255, 255, 255]);
        let mut matcher = ColorMatcher::from_entries(&palette).expect("palette");
        let used = assign(&grid, &mut matcher, &SymbolAlphabet::default());

        assert_eq!(used.len(), 2);
        let entries: Vec<_> = used.iter().collect();
        assert_eq!(entries[0].entry.id, "310");
        assert_eq!(entries[0].symbol, '1');
        assert_eq!(entries[1].entry.id, "B5200");
        assert_eq!(entries[1].symbol, '2');
        assert_eq!(used.total_count(), 400);
        assert_eq!(entries[0].count, 200);
    }

    #[test]
    fn assignment_is_repeatable() {
        let palette = crate::palette_store::PaletteStore::builtin().expect("builtin palette");
        let cells: Vec<Rgb> = (0..30u32 * 20)
            .map(|i| [(i * 11 % 256) as u8, (i * 3 % 256) as u8, (i * 29 % 256) as u8])
            .collect();
        let grid = QuantizedGrid::new(30, 20, cells).expect("valid grid");
        let alphabet = SymbolAlphabet::default();

        let mut first_matcher = ColorMatcher::new(&palette).expect("palette");
        let first = assign(&grid, &mut first_matcher, &alphabet);
        let mut second_matcher = ColorMatcher::new(&palette).expect("palette");
        let second = assign(&grid, &mut second_matcher, &alphabet);

        let first: Vec<_> = first.iter().cloned().collect();
        let second: Vec<_> = second.iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|e| e.count as u64).sum::<u64>(),
            30 * 20
        );
    }

    #[test]
    fn distinct_cells_sharing_a_thread_share_an_entry() {
        let palette = black_white_palette();
        let cells = vec![[5, 5, 5], [250, 250, 250], [0, 0, 0], [255, 255, 255]];
        let grid = QuantizedGrid::new(2, 2, cells).expect("valid grid");
        let mut matcher = ColorMatcher::from_entries(&palette).expect("palette");
        let used = assign(&grid, &mut matcher, &SymbolAlphabet::default());

        assert_eq!(used.len(), 2);
        assert_eq!(used.get("310").map(|e| e.count), Some(2));
        assert_eq!(used.for_cell([0, 0, 0]).map(|e| e.symbol), Some('1'));
        assert_eq!(used.for_cell([250, 250, 250]).map(|e| e.symbol), Some('2'));
        assert!(used.for_cell([1, 2, 3]).is_none());
    }

    #[test]
    fn symbols_cycle_when_alphabet_is_exhausted() {
        let palette: Vec<PaletteEntry> = (0..5u8)
            .map(|i| PaletteEntry::new(format!("C{}", i), [i * 50, 0, 0], ""))
            .collect();
        let cells: Vec<Rgb> = (0..5u8).map(|i| [i * 50, 0, 0]).collect();
        let grid = QuantizedGrid::new(5, 1, cells).expect("valid grid");
        let alphabet = SymbolAlphabet::new("XY").expect("alphabet");
        let mut matcher = ColorMatcher::from_entries(&palette).expect("palette");
        let used = assign(&grid, &mut matcher, &alphabet);

        let symbols: String = used.iter().map(|e| e.symbol).collect();
        assert_eq!(symbols, "XYXYX");
    }

    #[test]
    fn empty_alphabet_is_rejected() {
        assert!(SymbolAlphabet::new("").is_err());
    }
}
