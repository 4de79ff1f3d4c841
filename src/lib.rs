//! Cross-stitch chart generation.
//!
//! An image is reduced to a small grid of quantized colours, each colour is
//! mapped to the nearest thread of a palette and given a chart symbol, and
//! the result is laid out as drawing instructions that a renderer turns into
//! a PDF.

pub mod chart;
pub mod config;
pub mod error;
pub mod grid;
pub mod matcher;
pub mod palette_store;
pub mod pdf_export;
pub mod pipeline;
pub mod preview;
pub mod quantize;
pub mod symbols;

pub use chart::{Chart, ChartTexts, DrawOp, LayoutConfig, LegendOverflow, PageSize};
pub use config::PatternConfig;
pub use error::{ChartError, Result};
pub use grid::QuantizedGrid;
pub use palette_store::{PaletteEntry, PaletteStore, Rgb};
pub use pdf_export::{ChartRenderer, PdfRenderer};
pub use pipeline::{export_bundle, prepare, ChartContext, PreparedPattern};
pub use symbols::{SymbolAlphabet, UsedColors};
