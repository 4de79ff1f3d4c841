use crate::chart::{Chart, DrawOp, FontWeight, Stroke, TextAlign};
use crate::error::{ChartError, Result};
use crate::palette_store::Rgb;
use palette::Srgb;

/// Turns a chart instruction stream into a finished document.
pub trait ChartRenderer {
    type Output;

    fn render(&self, chart: &Chart) -> Result<Self::Output>;
}

/// Minimal PDF 1.4 writer: one page object per `BeginPage`, Helvetica text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl ChartRenderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, chart: &Chart) -> Result<Vec<u8>> {
        let mut pages: Vec<PdfPage> = Vec::new();

        for op in chart.ops() {
            if let DrawOp::BeginPage { width, height, .. } = op {
                pages.push(PdfPage {
                    width: *width,
                    height: *height,
                    content: String::new(),
                });
                continue;
            }
            let page = pages.last_mut().ok_or_else(|| {
                ChartError::InvalidParameter("Drawing instruction before first page.".to_string())
            })?;
            page.content.push_str(&op_cmd(op));
        }

        if pages.is_empty() {
            return Err(ChartError::InvalidParameter(
                "Chart has no pages to render.".to_string(),
            ));
        }

        let bytes = write_pdf_document(&pages);
        log::debug!("Rendered {} pages, {} bytes", pages.len(), bytes.len());
        Ok(bytes)
    }
}

struct PdfPage {
    width: f32,
    height: f32,
    content: String,
}

/// Helvetica advance widths for ' '..='~', in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ' '..='~'.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
    722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
    611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    500, 389, 280, 389, 584,
];

fn glyph_width(ch: char, weight: FontWeight) -> u16 {
    let table = match weight {
        FontWeight::Regular => &HELVETICA_WIDTHS,
        FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    match ch {
        ' '..='~' => table[ch as usize - ' ' as usize],
        '©' | '®' => 737,
        '°' => 400,
        _ => 556,
    }
}

fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
    let units: u32 = text.chars().map(|ch| glyph_width(ch, weight) as u32).sum();
    units as f32 * size / 1000.0
}

fn color_components(rgb: Rgb) -> (f32, f32, f32) {
    let color: Srgb<f32> = Srgb::<u8>::new(rgb[0], rgb[1], rgb[2]).into_format();
    (color.red, color.green, color.blue)
}

fn fill_cmd(rgb: Rgb) -> String {
    let (r, g, b) = color_components(rgb);
    format!("{:.3} {:.3} {:.3} rg\n", r, g, b)
}

fn stroke_cmd(stroke: Stroke) -> String {
    let (r, g, b) = color_components(stroke.color);
    format!("{:.3} {:.3} {:.3} RG {:.2} w\n", r, g, b, stroke.width)
}

fn op_cmd(op: &DrawOp) -> String {
    match op {
        DrawOp::BeginPage { .. } => String::new(),
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let paint = match (fill, stroke) {
                (Some(_), Some(_)) => "B",
                (Some(_), None) => "f",
                (None, Some(_)) => "S",
                (None, None) => return String::new(),
            };
            let mut cmd = String::new();
            if let Some(fill) = fill {
                cmd.push_str(&fill_cmd(*fill));
            }
            if let Some(stroke) = stroke {
                cmd.push_str(&stroke_cmd(*stroke));
            }
            cmd.push_str(&format!(
                "{:.3} {:.3} {:.3} {:.3} re {}\n",
                x, y, width, height, paint
            ));
            cmd
        }
        DrawOp::Line { from, to, stroke } => format!(
            "{}{:.3} {:.3} m {:.3} {:.3} l S\n",
            stroke_cmd(*stroke),
            from.0,
            from.1,
            to.0,
            to.1
        ),
        DrawOp::Text {
            x,
            y,
            text,
            size,
            color,
            align,
            weight,
        } => {
            let text = sanitize_text(text);
            let offset = match align {
                TextAlign::Left => 0.0,
                TextAlign::Center => text_width(&text, *size, *weight) / 2.0,
                TextAlign::Right => text_width(&text, *size, *weight),
            };
            format!(
                "{}{}",
                fill_cmd(*color),
                text_cmd(x - offset, *y, *size, *weight, &text)
            )
        }
    }
}

fn text_cmd(x: f32, y: f32, size: f32, weight: FontWeight, text: &str) -> String {
    let font = match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    };
    format!(
        "BT /{} {:.2} Tf 1 0 0 1 {:.3} {:.3} Tm ({}) Tj ET\n",
        font,
        size,
        x,
        y,
        escape_pdf_text(text)
    )
}

fn write_pdf_document(pages: &[PdfPage]) -> Vec<u8> {
    let page_count = pages.len();
    let first_page_object_id = 3usize;
    let first_content_object_id = first_page_object_id + page_count;
    let font_object_id = first_content_object_id + page_count;
    let bold_font_object_id = font_object_id + 1;

    let kids = (0..page_count)
        .map(|idx| format!("{} 0 R", first_page_object_id + idx))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count).into_bytes(),
    ];

    for (idx, page) in pages.iter().enumerate() {
        let content_id = first_content_object_id + idx;
        let page_obj = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.1} {:.1}] /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
            page.width, page.height, font_object_id, bold_font_object_id, content_id
        );
        objects.push(page_obj.into_bytes());
    }

    for page in pages {
        objects.push(stream_object(&page.content));
    }

    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    objects.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    let mut out = Vec::with_capacity(64 * 1024);
    out.extend_from_slice(b"%PDF-1.4\n");
    out.extend_from_slice(b"%stitchforge\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", idx + 1).as_bytes());
        out.extend_from_slice(object);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}

fn stream_object(stream: &str) -> Vec<u8> {
    let bytes = stream.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + 64);
    out.extend_from_slice(format!("<< /Length {} >>\nstream\n", bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"endstream");
    out
}

/// Keep characters WinAnsi can show (printable Latin-1); replace the rest.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|ch| {
            if (ch.is_ascii() && !ch.is_ascii_control()) || ('\u{A0}'..='\u{FF}').contains(&ch) {
                ch
            } else {
                '?'
            }
        })
        .collect()
}

/// Escape a sanitized string for a PDF literal; Latin-1 goes out as octal.
fn escape_pdf_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            c if c.is_ascii() => out.push(c),
            c => out.push_str(&format!("\\{:03o}", c as u32)),
        }
    }
    out
}
