//! Request orchestration: image in, charts and export bundle out.
//!
//! A [`ChartContext`] is built once per process and passed into every entry
//! point; nothing here reads global state.

use crate::chart::{build_dense_chart, build_multi_page_chart, Chart};
use crate::config::PatternConfig;
use crate::error::{ChartError, Result};
use crate::grid::{self, QuantizedGrid};
use crate::matcher::ColorMatcher;
use crate::palette_store::PaletteStore;
use crate::pdf_export::{ChartRenderer, PdfRenderer};
use crate::preview::render_preview;
use crate::symbols::{assign, SymbolAlphabet, UsedColors};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

const REQUEST_KEY_VERSION: u8 = 1;

pub struct ChartContext {
    pub palette: PaletteStore,
    pub alphabet: SymbolAlphabet,
}

impl ChartContext {
    pub fn new(palette: PaletteStore, alphabet: SymbolAlphabet) -> Self {
        Self { palette, alphabet }
    }

    /// Embedded DMC palette with the default glyph set.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PaletteStore::builtin()?, SymbolAlphabet::default()))
    }
}

/// A reduced grid with its threads and symbols, ready to be charted.
#[derive(Debug, Clone)]
pub struct PreparedPattern {
    pub grid: QuantizedGrid,
    pub used: UsedColors,
    request_key: String,
}

impl PreparedPattern {
    pub fn multi_page_chart(&self, config: &PatternConfig) -> Result<Chart> {
        build_multi_page_chart(&self.grid, &self.used, &config.layout(), &config.texts)
    }

    pub fn dense_chart(&self, config: &PatternConfig) -> Result<Chart> {
        build_dense_chart(&self.grid, &self.used, &config.layout())
    }

    /// Hex SHA-256 of the source pixels and the reduction parameters.
    pub fn request_key(&self) -> &str {
        &self.request_key
    }
}

pub fn prepare(
    ctx: &ChartContext,
    image: &DynamicImage,
    config: &PatternConfig,
) -> Result<PreparedPattern> {
    let start = Instant::now();
    let grid = grid::reduce(image, config.grid_size, config.color_count)?;
    let mut matcher = ColorMatcher::new(&ctx.palette)?;
    let used = assign(&grid, &mut matcher, &ctx.alphabet);

    log::info!(
        "Pattern {}x{}: {} DMC threads used, {} stitches ({}ms)",
        grid.width(),
        grid.height(),
        used.len(),
        used.total_count(),
        start.elapsed().as_millis()
    );

    Ok(PreparedPattern {
        request_key: build_request_key(image, config, &ctx.palette),
        grid,
        used,
    })
}

pub fn prepare_path(
    ctx: &ChartContext,
    path: impl AsRef<Path>,
    config: &PatternConfig,
) -> Result<PreparedPattern> {
    let image = image::open(path.as_ref())?;
    prepare(ctx, &image, config)
}

fn build_request_key(image: &DynamicImage, config: &PatternConfig, palette: &PaletteStore) -> String {
    let rgba = image.to_rgba8();
    let mut hasher = Sha256::new();
    hasher.update([REQUEST_KEY_VERSION]);
    hasher.update(rgba.width().to_le_bytes());
    hasher.update(rgba.height().to_le_bytes());
    hasher.update(rgba.as_raw());
    hasher.update(config.grid_size.to_le_bytes());
    hasher.update(config.color_count.to_le_bytes());
    for entry in palette.entries() {
        hasher.update(entry.id.as_bytes());
        hasher.update(entry.rgb());
    }
    format!("{:x}", hasher.finalize())
}

/// Files written by [`export_bundle`].
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub pixels: PathBuf,
    pub preview: PathBuf,
    pub color_pdf: PathBuf,
    pub bw_pdf: PathBuf,
    pub dense_pdf: PathBuf,
}

/// Write the reduced image, a raster preview, the colour and monochrome
/// multi-page charts and the dense chart into `dir`.
pub fn export_bundle(
    pattern: &PreparedPattern,
    config: &PatternConfig,
    dir: impl AsRef<Path>,
) -> Result<ExportBundle> {
    let dir = dir.as_ref();
    let start = Instant::now();
    fs::create_dir_all(dir)?;

    let bundle = ExportBundle {
        pixels: dir.join("pixels.png"),
        preview: dir.join("preview.png"),
        color_pdf: dir.join("color.pdf"),
        bw_pdf: dir.join("bw.pdf"),
        dense_pdf: dir.join("pk.pdf"),
    };

    pattern.grid.to_image().save(&bundle.pixels)?;
    render_preview(&pattern.grid, config.preview_width, true)?.save(&bundle.preview)?;

    let renderer = PdfRenderer;
    let color = PatternConfig {
        monochrome: false,
        ..config.clone()
    };
    let mono = PatternConfig {
        monochrome: true,
        ..config.clone()
    };
    fs::write(
        &bundle.color_pdf,
        renderer.render(&pattern.multi_page_chart(&color)?)?,
    )?;
    fs::write(
        &bundle.bw_pdf,
        renderer.render(&pattern.multi_page_chart(&mono)?)?,
    )?;
    fs::write(
        &bundle.dense_pdf,
        renderer.render(&pattern.dense_chart(config)?)?,
    )?;

    log::info!(
        "Exported bundle to {} ({}ms)",
        dir.display(),
        start.elapsed().as_millis()
    );
    Ok(bundle)
}

/// Render one chart to a PDF file.
pub fn write_pdf(chart: &Chart, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ChartError::InvalidParameter(
            "Output path is empty.".to_string(),
        ));
    }
    let bytes = PdfRenderer.render(chart)?;
    fs::write(path, &bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
