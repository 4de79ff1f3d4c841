//! Image-to-grid reduction: contain-resize, then adaptive quantization.

use crate::error::{ChartError, Result};
use crate::palette_store::Rgb;
use crate::quantize::quantize;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

pub const MIN_COLOR_COUNT: u32 = 2;
pub const MAX_COLOR_COUNT: u32 = 256;

/// A reduced, colour-limited stitch grid. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedGrid {
    width: u32,
    height: u32,
    cells: Vec<Rgb>,
}

impl QuantizedGrid {
    /// Build a grid from row-major cells.
    pub fn new(width: u32, height: u32, cells: Vec<Rgb>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ChartError::InvalidParameter(
                "Grid dimensions must be greater than 0.".to_string(),
            ));
        }
        if cells.len() != (width as usize) * (height as usize) {
            return Err(ChartError::InvalidParameter(format!(
                "Grid of {}x{} needs {} cells, got {}.",
                width,
                height,
                width as usize * height as usize,
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.cells[(y * self.width + x) as usize]
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.cells.chunks(self.width as usize)
    }

    pub fn distinct_colors(&self) -> usize {
        self.cells.iter().collect::<HashSet<_>>().len()
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(self.get(x, y)))
    }
}

/// Size that fits `width`x`height` inside a `max_dimension` square without
/// cropping. Never upscales.
pub fn contain_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width.max(height) <= max_dimension {
        return (width, height);
    }
    let scale = |side: u32, longer: u32| -> u32 {
        ((side as f64 * max_dimension as f64 / longer as f64).round() as u32).clamp(1, max_dimension)
    };
    if width >= height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

fn validate(max_dimension: u32, color_count: u32) -> Result<()> {
    if max_dimension < 1 {
        return Err(ChartError::InvalidParameter(
            "Grid dimension must be at least 1.".to_string(),
        ));
    }
    if !(MIN_COLOR_COUNT..=MAX_COLOR_COUNT).contains(&color_count) {
        return Err(ChartError::InvalidParameter(format!(
            "Color count must be between {} and {}, got {}.",
            MIN_COLOR_COUNT, MAX_COLOR_COUNT, color_count
        )));
    }
    Ok(())
}

/// Flatten alpha onto a white background.
fn flatten_rgb(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Reduce `image` to a stitch grid whose longer side is at most
/// `max_dimension` and which uses at most `color_count` distinct colours.
pub fn reduce(image: &DynamicImage, max_dimension: u32, color_count: u32) -> Result<QuantizedGrid> {
    validate(max_dimension, color_count)?;
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(ChartError::InvalidParameter(
            "Source image is empty.".to_string(),
        ));
    }

    let start = Instant::now();
    let rgb = flatten_rgb(image);
    let (width, height) = contain_dimensions(src_w, src_h, max_dimension);
    let resized = if (width, height) == (src_w, src_h) {
        rgb
    } else {
        image::imageops::resize(&rgb, width, height, FilterType::CatmullRom)
    };

    let pixels: Vec<Rgb> = resized.pixels().map(|p| p.0).collect();
    let cells = quantize(&pixels, color_count as usize);
    let grid = QuantizedGrid::new(width, height, cells)?;

    log::info!(
        "Reduced {}x{} image to {}x{} grid, {} colors, {}ms",
        src_w,
        src_h,
        width,
        height,
        grid.distinct_colors(),
        start.elapsed().as_millis()
    );

    Ok(grid)
}

pub fn reduce_bytes(bytes: &[u8], max_dimension: u32, color_count: u32) -> Result<QuantizedGrid> {
    validate(max_dimension, color_count)?;
    let image = image::load_from_memory(bytes)?;
    reduce(&image, max_dimension, color_count)
}

pub fn reduce_path(
    path: impl AsRef<Path>,
    max_dimension: u32,
    color_count: u32,
) -> Result<QuantizedGrid> {
    validate(max_dimension, color_count)?;
    let image = image::open(path)?;
    reduce(&image, max_dimension, color_count)
}
