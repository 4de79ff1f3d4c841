//! Raster stitch preview: the grid scaled up with nearest-neighbour sampling.

use crate::error::{ChartError, Result};
use crate::grid::QuantizedGrid;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

const GUIDE_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
const GUIDE_STEP: u32 = 10;

/// Scale `grid` to `target_width` pixels wide, keeping the aspect ratio.
/// With `guides`, a line is drawn every 10 stitches.
pub fn render_preview(grid: &QuantizedGrid, target_width: u32, guides: bool) -> Result<RgbImage> {
    if target_width == 0 {
        return Err(ChartError::InvalidParameter(
            "Preview width must be greater than 0.".to_string(),
        ));
    }
    let target_height = ((target_width as f64 * grid.height() as f64 / grid.width() as f64)
        .round() as u32)
        .max(1);

    let mut preview = image::imageops::resize(
        &grid.to_image(),
        target_width,
        target_height,
        FilterType::Nearest,
    );

    if guides {
        let sx = target_width as f32 / grid.width() as f32;
        let sy = target_height as f32 / grid.height() as f32;
        let right = (target_width - 1) as f32;
        let bottom = (target_height - 1) as f32;
        for gx in (GUIDE_STEP..grid.width()).step_by(GUIDE_STEP as usize) {
            let x = (gx as f32 * sx).round();
            draw_line_segment_mut(&mut preview, (x, 0.0), (x, bottom), GUIDE_COLOR);
        }
        for gy in (GUIDE_STEP..grid.height()).step_by(GUIDE_STEP as usize) {
            let y = (gy as f32 * sy).round();
            draw_line_segment_mut(&mut preview, (0.0, y), (right, y), GUIDE_COLOR);
        }
    }

    log::debug!(
        "Preview {}x{} from {}x{} grid",
        target_width,
        target_height,
        grid.width(),
        grid.height()
    );
    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(width: u32, height: u32) -> QuantizedGrid {
        let cells = (0..width * height)
            .map(|i| if i % width < width / 2 { [200, 0, 0] } else { [0, 0, 200] })
            .collect();
        QuantizedGrid::new(width, height, cells).expect("valid grid")
    }

    #[test]
    fn preview_keeps_aspect_and_cell_colors() {
        let grid = two_tone(20, 10);
        let preview = render_preview(&grid, 600, false).expect("preview");
        assert_eq!(preview.dimensions(), (600, 300));
        assert_eq!(preview.get_pixel(10, 10).0, [200, 0, 0]);
        assert_eq!(preview.get_pixel(590, 290).0, [0, 0, 200]);
    }

    #[test]
    fn guides_mark_every_tenth_stitch() {
        let grid = two_tone(20, 20);
        let preview = render_preview(&grid, 200, true).expect("preview");
        assert_eq!(preview.get_pixel(100, 5).0, GUIDE_COLOR.0);
        assert_eq!(preview.get_pixel(5, 100).0, GUIDE_COLOR.0);
        assert_eq!(preview.get_pixel(5, 5).0, [200, 0, 0]);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(render_preview(&two_tone(2, 2), 0, false).is_err());
    }
}
