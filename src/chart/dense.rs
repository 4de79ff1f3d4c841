//! Single-page dense chart for pattern-reader apps.
//!
//! The whole grid goes on one custom-sized page at a fixed cell size, always
//! in true colour, with a plain-text legend underneath. Legend lines keep the
//! `DMC {code}` token because downstream tools parse it. When the space below
//! the grid runs out the legend stops; the chart records how many rows made it.

use super::{
    resolve_cell, symbol_color, Chart, ChartBuilder, LayoutConfig, LegendOverflow, Stroke,
    TextStyle, LIGHT_GRAY,
};
use crate::error::{ChartError, Result};
use crate::grid::QuantizedGrid;
use crate::symbols::UsedColors;

const PAGE_MARGIN: f32 = 50.0;
const LEGEND_GAP: f32 = 40.0;
const LEGEND_LINE_HEIGHT: f32 = 15.0;
const LEGEND_BOTTOM: f32 = 20.0;

pub fn legend_line(symbol: char, code: &str, description: &str) -> String {
    format!("Symbol {} : DMC {} - {}", symbol, code, description)
}

pub fn build_dense_chart(
    grid: &QuantizedGrid,
    used: &UsedColors,
    layout: &LayoutConfig,
) -> Result<Chart> {
    let cell = layout.dense_cell_size;
    if cell.is_nan() || cell <= 0.0 {
        return Err(ChartError::InvalidParameter(format!(
            "Dense cell size must be positive, got {}.",
            cell
        )));
    }

    let cols = grid.width() as f32;
    let rows = grid.height() as f32;
    let page_width = cols * cell + 2.0 * PAGE_MARGIN;
    let page_height = rows * cell + PAGE_MARGIN + layout.dense_legend_space.max(0.0);
    let draw_x = PAGE_MARGIN;
    let draw_y = page_height - PAGE_MARGIN;

    let mut chart = ChartBuilder::default();
    chart.begin_page(page_width, page_height);

    let stroke = Stroke::new(LIGHT_GRAY, 0.1);
    let glyph = TextStyle::new(cell * 0.6).centered();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let used_color = resolve_cell(used, grid.get(x, y))?;
            let thread = used_color.entry.rgb();
            let rx = draw_x + x as f32 * cell;
            let ry = draw_y - (y + 1) as f32 * cell;
            chart.rect(rx, ry, (cell, cell), Some(thread), Some(stroke));
            chart.text(
                rx + cell / 2.0,
                ry + cell / 4.0,
                used_color.symbol.to_string(),
                glyph.color(symbol_color(thread)),
            );
        }
    }

    let mut y_leg = draw_y - rows * cell - LEGEND_GAP;
    chart.text(draw_x, y_leg, "Legend", TextStyle::new(12.0).bold());
    y_leg -= 20.0;

    let mut rendered = 0usize;
    for used_color in used.iter() {
        if y_leg < LEGEND_BOTTOM {
            break;
        }
        chart.text(
            draw_x,
            y_leg,
            legend_line(
                used_color.symbol,
                &used_color.entry.id,
                &used_color.entry.description,
            ),
            TextStyle::new(10.0),
        );
        rendered += 1;
        y_leg -= LEGEND_LINE_HEIGHT;
    }

    if rendered < used.len() {
        log::warn!(
            "Dense chart legend truncated: {} of {} colors listed",
            rendered,
            used.len()
        );
        chart.set_legend_overflow(LegendOverflow {
            rendered,
            total: used.len(),
        });
    }

    log::info!(
        "Dense chart: {}x{} stitches on {:.0}x{:.0} pt page, {} colors",
        grid.width(),
        grid.height(),
        page_width,
        page_height,
        used.len()
    );

    Ok(chart.finish())
}
