//! Multi-page chart: cover, tiled grid pages, paginated thread legend.

use super::{
    monochrome_fill, resolve_cell, symbol_color, Chart, ChartBuilder, ChartTexts, LayoutConfig,
    Stroke, TextStyle, BLACK, GRAY, LIGHT_GRAY, MAX_CELLS_PER_PAGE, WHITE,
};
use crate::error::Result;
use crate::grid::QuantizedGrid;
use crate::symbols::UsedColors;

const MAJOR_LINE_STEP: u32 = 10;
const LEGEND_ROW_HEIGHT: f32 = 20.0;
const LEGEND_BOTTOM: f32 = 50.0;

struct Page {
    width: f32,
    height: f32,
    margin: f32,
}

/// Number of grid tiles along one axis.
pub fn tile_count(cells: u32) -> u32 {
    cells.div_ceil(MAX_CELLS_PER_PAGE)
}

/// Build the multi-page chart for `grid`.
///
/// Page 1 is the cover. Grid tiles follow in row-major tile order, then the
/// legend, which continues onto further pages when a page fills up.
pub fn build_multi_page_chart(
    grid: &QuantizedGrid,
    used: &UsedColors,
    layout: &LayoutConfig,
    texts: &ChartTexts,
) -> Result<Chart> {
    let (width, height) = layout.page_size.dimensions();
    let page = Page {
        width,
        height,
        margin: layout.margin,
    };
    let mut chart = ChartBuilder::default();

    build_cover(&mut chart, grid, used, layout, texts, &page);

    for tile_y in 0..tile_count(grid.height()) {
        for tile_x in 0..tile_count(grid.width()) {
            build_grid_page(&mut chart, grid, used, layout, texts, &page, (tile_x, tile_y))?;
        }
    }

    build_legend(&mut chart, used, layout, &page);

    let chart = chart.finish();
    log::info!(
        "Multi-page chart: {}x{} stitches, {} colors, {} pages, monochrome={}",
        grid.width(),
        grid.height(),
        used.len(),
        chart.page_count(),
        layout.monochrome
    );
    Ok(chart)
}

fn page_footer(chart: &mut ChartBuilder, page: &Page, number: u32, y: f32, size: f32) {
    chart.text(
        page.width - page.margin,
        y,
        format!("Page {}", number),
        TextStyle::new(size).right(),
    );
}

fn build_cover(
    chart: &mut ChartBuilder,
    grid: &QuantizedGrid,
    used: &UsedColors,
    layout: &LayoutConfig,
    texts: &ChartTexts,
    page: &Page,
) {
    let number = chart.begin_page(page.width, page.height);
    let center_x = page.width / 2.0;

    chart.text(
        center_x,
        page.height - 50.0,
        texts.main_title.as_str(),
        TextStyle::new(14.0).centered(),
    );
    chart.line(
        (page.margin, page.height - 70.0),
        (page.width - page.margin, page.height - 70.0),
        Stroke::new(BLACK, 0.5),
    );
    if !texts.sub_title.is_empty() {
        chart.text(
            center_x,
            page.height - 88.0,
            texts.sub_title.as_str(),
            TextStyle::new(10.0).centered(),
        );
    }

    // Whole-grid preview, fitted into a square box and drawn as row runs.
    let box_size = layout.preview_width;
    let cell = (box_size / grid.width() as f32).min(box_size / grid.height() as f32);
    let origin_x = (page.width - grid.width() as f32 * cell) / 2.0;
    let top = page.height - 100.0;
    for (y, row) in grid.rows().enumerate() {
        let cell_y = top - (y as f32 + 1.0) * cell;
        let mut run_start = 0usize;
        for x in 1..=row.len() {
            if x == row.len() || row[x] != row[run_start] {
                chart.rect(
                    origin_x + run_start as f32 * cell,
                    cell_y,
                    ((x - run_start) as f32 * cell, cell),
                    Some(row[run_start]),
                    None,
                );
                run_start = x;
            }
        }
    }
    chart.rect(
        origin_x,
        top - grid.height() as f32 * cell,
        (grid.width() as f32 * cell, grid.height() as f32 * cell),
        None,
        Some(Stroke::new(BLACK, 0.5)),
    );

    let caption_y = top - box_size - 50.0;
    chart.text(
        center_x,
        caption_y,
        format!("Design size: {} x {} stitches", grid.width(), grid.height()),
        TextStyle::new(10.0).centered(),
    );
    chart.text(
        center_x,
        caption_y - 16.0,
        format!("{} DMC colors", used.len()),
        TextStyle::new(10.0).centered(),
    );

    chart.text(page.margin, 100.0, texts.import_note.as_str(), TextStyle::new(10.0));
    chart.text(page.margin, 60.0, texts.copyright.as_str(), TextStyle::new(10.0));
    page_footer(chart, page, number, 60.0, 10.0);
}

fn build_grid_page(
    chart: &mut ChartBuilder,
    grid: &QuantizedGrid,
    used: &UsedColors,
    layout: &LayoutConfig,
    texts: &ChartTexts,
    page: &Page,
    (tile_x, tile_y): (u32, u32),
) -> Result<()> {
    let number = chart.begin_page(page.width, page.height);
    chart.text(
        page.width / 2.0,
        page.height - 25.0,
        format!("{} - Part {},{}", texts.main_title, tile_x + 1, tile_y + 1),
        TextStyle::new(10.0).centered().bold(),
    );

    let x_start = tile_x * MAX_CELLS_PER_PAGE;
    let x_end = ((tile_x + 1) * MAX_CELLS_PER_PAGE).min(grid.width());
    let y_start = tile_y * MAX_CELLS_PER_PAGE;
    let y_end = ((tile_y + 1) * MAX_CELLS_PER_PAGE).min(grid.height());
    let cols = (x_end - x_start) as f32;
    let rows = (y_end - y_start) as f32;

    let cell = ((page.width - 2.0 * page.margin) / cols).min((page.height - 120.0) / rows);
    let draw_x = (page.width - cols * cell) / 2.0;
    let draw_y = page.height - 60.0;

    let thin = if layout.monochrome {
        Stroke::new(GRAY, 0.1)
    } else {
        Stroke::new(LIGHT_GRAY, 0.1)
    };
    let glyph = TextStyle::new(cell * 0.7).centered();

    for y in y_start..y_end {
        for x in x_start..x_end {
            let used_color = resolve_cell(used, grid.get(x, y))?;
            let thread = used_color.entry.rgb();
            let (fill, text_color) = if layout.monochrome {
                (monochrome_fill(thread), BLACK)
            } else {
                (thread, symbol_color(thread))
            };

            let cell_x = draw_x + (x - x_start) as f32 * cell;
            let cell_y = draw_y - (y - y_start + 1) as f32 * cell;
            chart.rect(cell_x, cell_y, (cell, cell), Some(fill), Some(thin));
            chart.text(
                cell_x + cell / 2.0,
                cell_y + cell / 4.0,
                used_color.symbol.to_string(),
                glyph.color(text_color),
            );
        }
    }

    // Every 10th grid line, counted across the whole pattern.
    let heavy = Stroke::new(BLACK, 0.7);
    let bottom = draw_y - rows * cell;
    let right = draw_x + cols * cell;
    let label = TextStyle::new(6.0).color(GRAY);
    for gx in (x_start..=x_end).filter(|gx| gx % MAJOR_LINE_STEP == 0) {
        let line_x = draw_x + (gx - x_start) as f32 * cell;
        chart.line((line_x, bottom), (line_x, draw_y), heavy);
        if gx > 0 {
            chart.text(line_x, draw_y + 3.0, gx.to_string(), label.centered());
        }
    }
    for gy in (y_start..=y_end).filter(|gy| gy % MAJOR_LINE_STEP == 0) {
        let line_y = draw_y - (gy - y_start) as f32 * cell;
        chart.line((draw_x, line_y), (right, line_y), heavy);
        if gy > 0 {
            chart.text(draw_x - 3.0, line_y - 2.0, gy.to_string(), label.right());
        }
    }

    page_footer(chart, page, number, 30.0, 8.0);
    Ok(())
}

fn legend_header(chart: &mut ChartBuilder, page: &Page, title: &str) -> u32 {
    let number = chart.begin_page(page.width, page.height);
    chart.text(
        page.margin,
        page.height - 50.0,
        title,
        TextStyle::new(14.0).bold(),
    );
    let header = TextStyle::new(9.0).bold();
    let y = page.height - 75.0;
    chart.text(page.margin, y, "Symbol", header);
    chart.text(page.margin + 40.0, y, "DMC", header);
    chart.text(page.margin + 100.0, y, "Description", header);
    chart.text(page.margin + 300.0, y, "Stitches", header);
    number
}

fn build_legend(chart: &mut ChartBuilder, used: &UsedColors, layout: &LayoutConfig, page: &Page) {
    let mut number = legend_header(chart, page, "Thread Legend (DMC)");
    let mut y = page.height - 100.0;
    let body = TextStyle::new(10.0);
    let swatch_stroke = Stroke::new(BLACK, 0.5);

    for used_color in used.iter() {
        if y < LEGEND_BOTTOM {
            page_footer(chart, page, number, 30.0, 8.0);
            number = legend_header(chart, page, "Thread Legend (DMC, continued)");
            y = page.height - 100.0;
        }

        let thread = used_color.entry.rgb();
        let (swatch, glyph_color) = if layout.monochrome {
            (WHITE, BLACK)
        } else {
            (thread, symbol_color(thread))
        };
        chart.rect(
            page.margin,
            y - 2.0,
            (12.0, 12.0),
            Some(swatch),
            Some(swatch_stroke),
        );
        chart.text(
            page.margin + 6.0,
            y + 1.0,
            used_color.symbol.to_string(),
            TextStyle::new(9.0).centered().color(glyph_color),
        );
        chart.text(page.margin + 40.0, y, used_color.entry.id.as_str(), body);
        chart.text(
            page.margin + 100.0,
            y,
            used_color.entry.description.as_str(),
            body,
        );
        chart.text(page.margin + 300.0, y, used_color.count.to_string(), body);
        y -= LEGEND_ROW_HEIGHT;
    }

    page_footer(chart, page, number, 30.0, 8.0);
}
