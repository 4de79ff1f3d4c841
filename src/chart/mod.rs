//! Backend-agnostic chart drawing instructions and shared layout.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the page.
//! Text `y` is the baseline.

mod dense;
mod multi_page;

pub use dense::{build_dense_chart, legend_line};
pub use multi_page::{build_multi_page_chart, tile_count};

use crate::error::{ChartError, Result};
use crate::palette_store::Rgb;
use crate::symbols::{UsedColorEntry, UsedColors};
use serde::Deserialize;

/// Largest tile (in stitches per side) placed on one grid page.
pub const MAX_CELLS_PER_PAGE: u32 = 50;

const A4_WIDTH_PT: f32 = 595.0;
const A4_HEIGHT_PT: f32 = 842.0;
const LETTER_WIDTH_PT: f32 = 612.0;
const LETTER_HEIGHT_PT: f32 = 792.0;

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const GRAY: Rgb = [128, 128, 128];
pub const LIGHT_GRAY: Rgb = [211, 211, 211];

#[derive(Debug, Deserialize, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (A4_WIDTH_PT, A4_HEIGHT_PT),
            PageSize::Letter => (LETTER_WIDTH_PT, LETTER_HEIGHT_PT),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

impl Stroke {
    pub fn new(color: Rgb, width: f32) -> Self {
        Self { color, width }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    BeginPage {
        number: u32,
        width: f32,
        height: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        color: Rgb,
        align: TextAlign,
        weight: FontWeight,
    },
}

/// Legend rows that did not fit on the page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LegendOverflow {
    pub rendered: usize,
    pub total: usize,
}

/// A page-structured instruction stream.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    ops: Vec<DrawOp>,
    legend_overflow: Option<LegendOverflow>,
}

impl Chart {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn page_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::BeginPage { .. }))
            .count()
    }

    /// Instruction slices, one per page, each starting with its `BeginPage`.
    pub fn pages(&self) -> Vec<&[DrawOp]> {
        let starts: Vec<usize> = self
            .ops
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, DrawOp::BeginPage { .. }))
            .map(|(i, _)| i)
            .collect();
        starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(self.ops.len());
                &self.ops[start..end]
            })
            .collect()
    }

    pub fn legend_overflow(&self) -> Option<LegendOverflow> {
        self.legend_overflow
    }

    /// All text drawn, in emission order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Appends instructions and numbers pages sequentially from 1.
#[derive(Default)]
pub(crate) struct ChartBuilder {
    ops: Vec<DrawOp>,
    pages: u32,
    legend_overflow: Option<LegendOverflow>,
}

impl ChartBuilder {
    pub fn begin_page(&mut self, width: f32, height: f32) -> u32 {
        self.pages += 1;
        self.ops.push(DrawOp::BeginPage {
            number: self.pages,
            width,
            height,
        });
        self.pages
    }

    pub fn rect(
        &mut self,
        x: f32,
        y: f32,
        size: (f32, f32),
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    ) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width: size.0,
            height: size.1,
            fill,
            stroke,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), stroke: Stroke) {
        self.ops.push(DrawOp::Line { from, to, stroke });
    }

    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, style: TextStyle) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            size: style.size,
            color: style.color,
            align: style.align,
            weight: style.weight,
        });
    }

    pub fn set_legend_overflow(&mut self, overflow: LegendOverflow) {
        self.legend_overflow = Some(overflow);
    }

    pub fn finish(self) -> Chart {
        Chart {
            ops: self.ops,
            legend_overflow: self.legend_overflow,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct TextStyle {
    pub size: f32,
    pub color: Rgb,
    pub align: TextAlign,
    pub weight: FontWeight,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            color: BLACK,
            align: TextAlign::Left,
            weight: FontWeight::Regular,
        }
    }

    pub fn centered(self) -> Self {
        Self {
            align: TextAlign::Center,
            ..self
        }
    }

    pub fn right(self) -> Self {
        Self {
            align: TextAlign::Right,
            ..self
        }
    }

    pub fn bold(self) -> Self {
        Self {
            weight: FontWeight::Bold,
            ..self
        }
    }

    pub fn color(self, color: Rgb) -> Self {
        Self { color, ..self }
    }
}

/// User-supplied caption text for the multi-page chart.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartTexts {
    pub main_title: String,
    pub sub_title: String,
    pub import_note: String,
    pub copyright: String,
}

impl Default for ChartTexts {
    fn default() -> Self {
        Self {
            main_title: "My Beautiful Flower".to_string(),
            sub_title: "Cross stitch chart".to_string(),
            import_note: "Chart imported from image".to_string(),
            copyright: "©2026 My Copyright".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub margin: f32,
    pub monochrome: bool,
    /// Width of the whole-grid preview on the cover page.
    pub preview_width: f32,
    /// Cell size of the single-page dense chart.
    pub dense_cell_size: f32,
    /// Space left below the dense grid for its legend.
    pub dense_legend_space: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: 50.0,
            monochrome: false,
            preview_width: 350.0,
            dense_cell_size: 15.0,
            dense_legend_space: 100.0,
        }
    }
}

pub(crate) fn resolve_cell(used: &UsedColors, rgb: Rgb) -> Result<&UsedColorEntry> {
    used.for_cell(rgb).ok_or_else(|| {
        ChartError::InvalidParameter(format!(
            "Grid color #{:02X}{:02X}{:02X} has no assigned thread.",
            rgb[0], rgb[1], rgb[2]
        ))
    })
}

/// Perceived brightness on a 0-255 scale.
pub fn brightness(rgb: Rgb) -> f32 {
    (rgb[0] as f32 * 299.0 + rgb[1] as f32 * 587.0 + rgb[2] as f32 * 114.0) / 1000.0
}

/// White glyphs on dark fills, black on light ones.
pub fn symbol_color(fill: Rgb) -> Rgb {
    if brightness(fill) < 125.0 {
        WHITE
    } else {
        BLACK
    }
}

/// Luma remapped into [0.6, 1.0] so no monochrome cell is near-black.
pub fn monochrome_fill(rgb: Rgb) -> Rgb {
    let luma = (rgb[0] as f32 * 0.299 + rgb[1] as f32 * 0.587 + rgb[2] as f32 * 0.114) / 255.0;
    let level = ((0.6 + luma * 0.4) * 255.0).round().clamp(0.0, 255.0) as u8;
    [level, level, level]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_color_follows_brightness_threshold() {
        assert_eq!(symbol_color([0, 0, 0]), WHITE);
        assert_eq!(symbol_color([255, 255, 255]), BLACK);
        // 0.587 * 213 = 125.03
        assert_eq!(symbol_color([0, 213, 0]), BLACK);
        assert_eq!(symbol_color([0, 212, 0]), WHITE);
    }

    #[test]
    fn monochrome_never_goes_dark() {
        assert_eq!(monochrome_fill([0, 0, 0]), [153, 153, 153]);
        assert_eq!(monochrome_fill([255, 255, 255]), [255, 255, 255]);
        let mid = monochrome_fill([128, 64, 200]);
        assert!(mid[0] >= 153 && mid[0] == mid[1] && mid[1] == mid[2]);
    }

    #[test]
    fn pages_split_on_begin_page() {
        let mut builder = ChartBuilder::default();
        assert_eq!(builder.begin_page(100.0, 100.0), 1);
        builder.text(1.0, 1.0, "a", TextStyle::new(10.0));
        assert_eq!(builder.begin_page(200.0, 50.0), 2);
        builder.rect(0.0, 0.0, (1.0, 1.0), Some(BLACK), None);
        builder.line((0.0, 0.0), (1.0, 1.0), Stroke::new(BLACK, 1.0));
        let chart = builder.finish();

        assert_eq!(chart.page_count(), 2);
        let pages = chart.pages();
        assert_eq!(pages[0].len(), 2);
        assert_eq!(pages[1].len(), 3);
        assert_eq!(chart.texts().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn layout_config_reads_partial_json() {
        let layout: LayoutConfig =
            serde_json::from_str(r#"{"page_size": "letter", "monochrome": true}"#)
                .expect("layout should parse");
        assert_eq!(layout.page_size.dimensions(), (612.0, 792.0));
        assert!(layout.monochrome);
        assert_eq!(layout.margin, 50.0);
    }
}
