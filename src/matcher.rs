use crate::error::{ChartError, Result};
use crate::palette_store::{PaletteEntry, PaletteStore, Rgb};
use std::collections::HashMap;

/// Squared Euclidean distance in RGB space.
fn distance_sq(a: Rgb, b: Rgb) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Euclidean distance in RGB space.
pub fn distance(a: Rgb, b: Rgb) -> f64 {
    (distance_sq(a, b) as f64).sqrt()
}

/// Find the palette entry nearest to `rgb`.
///
/// Ties go to the entry that appears first in palette order.
pub fn closest(rgb: Rgb, palette: &[PaletteEntry]) -> Result<&PaletteEntry> {
    closest_index(rgb, palette).map(|idx| &palette[idx])
}

fn closest_index(rgb: Rgb, palette: &[PaletteEntry]) -> Result<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, entry) in palette.iter().enumerate() {
        let dist = distance_sq(rgb, entry.rgb());
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((idx, dist)),
        }
        if dist == 0 {
            break;
        }
    }
    best.map(|(idx, _)| idx).ok_or(ChartError::PaletteEmpty)
}

/// Memoizing nearest-colour lookup for one grid processing run.
///
/// A given RGB value always maps to the same entry, so each distinct colour
/// is scanned against the palette only once.
pub struct ColorMatcher<'p> {
    palette: &'p [PaletteEntry],
    cache: HashMap<Rgb, usize>,
}

impl<'p> ColorMatcher<'p> {
    pub fn new(store: &'p PaletteStore) -> Result<Self> {
        Self::from_entries(store.entries())
    }

    pub fn from_entries(palette: &'p [PaletteEntry]) -> Result<Self> {
        if palette.is_empty() {
            return Err(ChartError::PaletteEmpty);
        }
        Ok(Self {
            palette,
            cache: HashMap::new(),
        })
    }

    pub fn closest(&mut self, rgb: Rgb) -> &'p PaletteEntry {
        let palette = self.palette;
        let idx = *self.cache.entry(rgb).or_insert_with(|| {
            // Non-empty palette is checked at construction.
            closest_index(rgb, palette).unwrap_or(0)
        });
        &palette[idx]
    }

    pub fn palette(&self) -> &'p [PaletteEntry] {
        self.palette
    }

    /// Number of distinct colours resolved so far.
    pub fn cached_colors(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry::new("310", [0, 0, 0], "Black"),
            PaletteEntry::new("B5200", [255, 255, 255], "Snow White"),
            PaletteEntry::new("666", [236, 33, 48], "Bright Red"),
            PaletteEntry::new("336", [19, 41, 75], "Navy Blue"),
            PaletteEntry::new("823", [19, 41, 75], "Dark Navy Blue"),
        ]
    }

    #[test]
    fn exact_colors_match_with_zero_distance() {
        let palette = palette();
        for entry in &palette[..4] {
            let found = closest(entry.rgb(), &palette).expect("palette is not empty");
            assert_eq!(found.id, entry.id);
            assert_eq!(distance(found.rgb(), entry.rgb()), 0.0);
        }
    }

    #[test]
    fn identical_entries_resolve_to_first_in_order() {
        let palette = palette();
        let found = closest([19, 41, 75], &palette).expect("palette is not empty");
        assert_eq!(found.id, "336");
    }

    #[test]
    fn equidistant_query_takes_first_entry() {
        let palette = vec![
            PaletteEntry::new("low", [100, 100, 100], ""),
            PaletteEntry::new("high", [110, 100, 100], ""),
        ];
        let found = closest([105, 100, 100], &palette).expect("palette is not empty");
        assert_eq!(found.id, "low");

        let reversed: Vec<_> = palette.into_iter().rev().collect();
        let found = closest([105, 100, 100], &reversed).expect("palette is not empty");
        assert_eq!(found.id, "high");
    }

    #[test]
    fn nearest_wins_over_order() {
        let palette = palette();
        let found = closest([240, 30, 50], &palette).expect("palette is not empty");
        assert_eq!(found.id, "666");
        let found = closest([250, 250, 245], &palette).expect("palette is not empty");
        assert_eq!(found.id, "B5200");
    }

    #[test]
    fn empty_palette_fails() {
        assert!(matches!(closest([1, 2, 3], &[]), Err(ChartError::PaletteEmpty)));
        assert!(matches!(
            ColorMatcher::from_entries(&[]),
            Err(ChartError::PaletteEmpty)
        ));
    }

    #[test]
    fn matcher_memoizes_per_color() {
        let palette = palette();
        let mut matcher = ColorMatcher::from_entries(&palette).expect("palette is not empty");
        let first = matcher.closest([10, 10, 10]).id.clone();
        let again = matcher.closest([10, 10, 10]).id.clone();
        matcher.closest([250, 250, 250]);

        assert_eq!(first, "310");
        assert_eq!(first, again);
        assert_eq!(matcher.cached_colors(), 2);
    }

    #[test]
    fn matcher_agrees_with_direct_scan() {
        let palette = palette();
        let mut matcher = ColorMatcher::from_entries(&palette).expect("palette is not empty");
        for rgb in [[0, 0, 1], [128, 128, 128], [20, 40, 70], [200, 50, 50]] {
            let direct = closest(rgb, &palette).expect("palette is not empty");
            assert_eq!(matcher.closest(rgb).id, direct.id);
        }
    }
}
