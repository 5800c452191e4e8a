use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::record::TradeRecord;
use crate::storage::{file_stem, UserPaths};
use crate::{JournalError, JournalResult};

// A4 portrait, millimetres
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const LINE_HEIGHT_MM: f32 = 10.0;
pub const PRINTABLE_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

const LOGO_WIDTH_MM: f32 = 30.0;
const LOGO_MAX_HEIGHT_MM: f32 = 40.0;
const HEADER_SPACE_MM: f32 = 45.0;
const IMAGE_DPI: f32 = 300.0;
const PT_TO_MM: f32 = 0.352_778;
/// Advance for glyphs outside printable ASCII, in 1/1000 em.
const FALLBACK_ADVANCE: u16 = 1000;

// Helvetica advance widths for ' '..='~', in 1/1000 em (Adobe core font metrics)
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// ---------------------------------------------------------------------------
// Layout model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };
    pub const PROFIT_GREEN: Rgb8 = Rgb8 { r: 0, g: 128, b: 0 };
    pub const LOSS_RED: Rgb8 = Rgb8 { r: 255, g: 0, b: 0 };
    pub const ACCENT_BLUE: Rgb8 = Rgb8 { r: 0, g: 0, b: 255 };

    fn to_color(self) -> Color {
        Color::Rgb(Rgb::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            None,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size_pt: f32,
    pub color: Rgb8,
    pub underline: bool,
}

impl TextStyle {
    pub const BODY: TextStyle = TextStyle {
        weight: FontWeight::Regular,
        size_pt: 12.0,
        color: Rgb8::BLACK,
        underline: false,
    };

    pub const TITLE: TextStyle = TextStyle {
        weight: FontWeight::Bold,
        size_pt: 14.0,
        color: Rgb8::BLACK,
        underline: false,
    };

    /// Bold, underlined, 14 pt in the given colour.
    pub fn emphasis(color: Rgb8) -> TextStyle {
        TextStyle {
            weight: FontWeight::Bold,
            size_pt: 14.0,
            color,
            underline: true,
        }
    }

    pub fn colored(color: Rgb8) -> TextStyle {
        TextStyle {
            color,
            ..TextStyle::BODY
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportElement {
    /// Drawn at the top centre of the first page; does not advance the cursor.
    Logo { path: PathBuf, width_mm: f32 },
    Spacer(f32),
    Text {
        text: String,
        style: TextStyle,
        align: Align,
    },
    Image { path: PathBuf, width_mm: f32 },
    /// Word-wrapped to the printable width
    Paragraph { text: String, style: TextStyle },
}

/// Ordered description of a trade report, independent of the PDF backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub elements: Vec<ReportElement>,
}

impl ReportLayout {
    /// Lay out a record. `logo` and `screenshot` are the resolved asset paths, if any.
    pub fn for_record(
        record: &TradeRecord,
        logo: Option<PathBuf>,
        screenshot: Option<PathBuf>,
    ) -> Self {
        let mut elements = Vec::new();
        let line = |text: String| ReportElement::Text {
            text,
            style: TextStyle::BODY,
            align: Align::Left,
        };

        if let Some(path) = logo {
            elements.push(ReportElement::Logo {
                path,
                width_mm: LOGO_WIDTH_MM,
            });
        }
        elements.push(ReportElement::Spacer(HEADER_SPACE_MM));

        let title = format!("Trade Journal - {}", record.symbol);
        elements.push(ReportElement::Text {
            text: title.clone(),
            style: TextStyle::TITLE,
            align: Align::Center,
        });
        elements.push(ReportElement::Spacer(LINE_HEIGHT_MM));

        elements.push(line(format!("Symbol: {}", record.symbol)));
        elements.push(line(format!("Position: {}", record.position)));
        elements.push(line(format!("Entry: {}", record.entry_price)));
        elements.push(line(format!("Exit: {}", record.exit_price)));
        elements.push(line(format!("Lot size: {}", record.lot_size)));
        elements.push(line(format!("Commission: {}", record.commission)));

        let pnl_color = if record.pnl >= Decimal::ZERO {
            Rgb8::PROFIT_GREEN
        } else {
            Rgb8::LOSS_RED
        };
        elements.push(ReportElement::Text {
            text: format!("PnL: ${:.2}", record.pnl),
            style: TextStyle::emphasis(pnl_color),
            align: Align::Left,
        });

        elements.push(line(format!(
            "Screenshot: {}",
            record.screenshot.as_deref().unwrap_or("None")
        )));
        elements.push(line(format!(
            "Entry time: {}",
            record.entry_time.format("%d/%m/%Y %H:%M:%S")
        )));
        elements.push(line(format!(
            "Exit time: {}",
            record.exit_time.format("%d/%m/%Y %H:%M:%S")
        )));
        elements.push(line(format!("Duration: {}", record.duration)));
        elements.push(line(format!("Trade number: {}", record.trade_number)));
        elements.push(ReportElement::Text {
            text: format!("Position ID: {}", record.position_id),
            style: TextStyle::colored(Rgb8::ACCENT_BLUE),
            align: Align::Left,
        });
        elements.push(line(format!("Rating: {}/5", record.rating)));

        if let Some(path) = screenshot {
            elements.push(ReportElement::Image {
                path,
                width_mm: PRINTABLE_WIDTH_MM,
            });
        }

        elements.push(ReportElement::Spacer(5.0));
        elements.push(ReportElement::Paragraph {
            text: format!("Notes: {}", record.notes),
            style: TextStyle::BODY,
        });

        ReportLayout { title, elements }
    }

    /// Text of every text and paragraph element, in order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                ReportElement::Text { text, .. } | ReportElement::Paragraph { text, .. } => {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `<report_name>.pdf` when a custom name was given, else `<symbol>_<id>.pdf`.
pub fn report_file_name(record: &TradeRecord) -> String {
    let stem = match record.report_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}_{}", record.symbol, record.id),
    };
    format!("{}.pdf", file_stem(&stem))
}

/// Render `record` into a PDF in the user's report directory and return its path.
pub fn render_report(record: &TradeRecord, paths: &UserPaths) -> JournalResult<PathBuf> {
    let logo = Some(paths.logo_path(&record.symbol)).filter(|p| p.is_file());
    let screenshot = record.screenshot_path(&paths.data_dir);
    let layout = ReportLayout::for_record(record, logo, screenshot);

    let out_path = paths.reports_dir.join(report_file_name(record));
    let pages = render_pdf(&layout, &out_path)?;
    info!(id = %record.id, path = %out_path.display(), pages, "rendered trade report");
    Ok(out_path)
}

/// Word wrap `text` set in `style` so every line fits within `max_width_mm`.
pub fn wrap_text(text: &str, style: TextStyle, max_width_mm: f32) -> Vec<String> {
    wrap_with(text, max_width_mm, |line| text_width_mm(line, style))
}

/// Greedy word wrap against an arbitrary width measure. Explicit newlines are
/// kept and words wider than a line are split between characters.
fn wrap_with(text: &str, max_width: f32, width: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if width(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if current.chars().count() > 1 && width(&current) > max_width {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Rendered width of `text` in the builtin Helvetica faces.
pub fn text_width_mm(text: &str, style: TextStyle) -> f32 {
    let table = match style.weight {
        FontWeight::Regular => &HELVETICA_WIDTHS,
        FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => u32::from(table[c as usize - ' ' as usize]),
            _ => u32::from(FALLBACK_ADVANCE),
        })
        .sum();
    units as f32 / 1000.0 * style.size_pt * PT_TO_MM
}

// ---------------------------------------------------------------------------
// PDF backend
// ---------------------------------------------------------------------------

fn render_err(e: impl std::fmt::Display) -> JournalError {
    JournalError::Render(e.to_string())
}

/// Returns the number of pages written.
fn render_pdf(layout: &ReportLayout, out_path: &Path) -> JournalResult<usize> {
    let mut writer = PageWriter::new(&layout.title)?;

    for element in &layout.elements {
        match element {
            ReportElement::Logo { path, width_mm } => match image::open(path) {
                Ok(img) => writer.logo(&img, *width_mm)?,
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable logo"),
            },
            ReportElement::Spacer(height) => writer.advance(*height),
            ReportElement::Text { text, style, align } => writer.text(text, *style, *align),
            ReportElement::Image { path, width_mm } => {
                let img = image::open(path).map_err(|e| JournalError::read(path, e))?;
                writer.image(&img, *width_mm)?;
            }
            ReportElement::Paragraph { text, style } => {
                for line in wrap_text(text, *style, PRINTABLE_WIDTH_MM) {
                    writer.text(&line, *style, Align::Left);
                }
            }
        }
    }

    writer.finish(out_path)
}

/// Top-down cursor over a growing PDF document.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance of the cursor from the top edge
    y_mm: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> JournalResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(PageWriter {
            doc,
            layer,
            regular,
            bold,
            y_mm: MARGIN_MM,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_mm = MARGIN_MM;
    }

    /// Break to a new page unless `height` still fits above the bottom margin.
    fn ensure_room(&mut self, height: f32) {
        let at_top = self.y_mm <= MARGIN_MM;
        if !at_top && self.y_mm + height > PAGE_HEIGHT_MM - MARGIN_MM {
            self.new_page();
        }
    }

    fn advance(&mut self, height: f32) {
        if self.y_mm + height > PAGE_HEIGHT_MM - MARGIN_MM {
            self.new_page();
        } else {
            self.y_mm += height;
        }
    }

    fn text(&mut self, text: &str, style: TextStyle, align: Align) {
        self.ensure_room(LINE_HEIGHT_MM);

        let width = text_width_mm(text, style);
        let x = match align {
            Align::Left => MARGIN_MM,
            Align::Center => ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM),
        };
        // Baseline roughly centred in the line cell
        let baseline = self.y_mm + LINE_HEIGHT_MM / 2.0 + style.size_pt * PT_TO_MM * 0.35;
        let y = PAGE_HEIGHT_MM - baseline;

        let font = match style.weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        self.layer.set_fill_color(style.color.to_color());
        self.layer.use_text(text, style.size_pt, Mm(x), Mm(y), font);

        if style.underline {
            let underline_y = y - 1.0;
            self.layer.set_outline_color(style.color.to_color());
            self.layer.set_outline_thickness(0.6);
            self.layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(x), Mm(underline_y)), false),
                    (Point::new(Mm(x + width), Mm(underline_y)), false),
                ],
                is_closed: false,
            });
            self.layer.set_outline_color(Rgb8::BLACK.to_color());
        }
        self.layer.set_fill_color(Rgb8::BLACK.to_color());

        self.y_mm += LINE_HEIGHT_MM;
    }

    fn logo(&mut self, img: &DynamicImage, width_mm: f32) -> JournalResult<()> {
        let (width_mm, height_mm) = fit(img, width_mm, LOGO_MAX_HEIGHT_MM)?;
        let x = (PAGE_WIDTH_MM - width_mm) / 2.0;
        let y = PAGE_HEIGHT_MM - MARGIN_MM - height_mm;
        self.place(img, x, y, width_mm);
        Ok(())
    }

    fn image(&mut self, img: &DynamicImage, width_mm: f32) -> JournalResult<()> {
        let max_height = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
        let (width_mm, height_mm) = fit(img, width_mm, max_height)?;
        self.ensure_room(height_mm);
        let y = PAGE_HEIGHT_MM - self.y_mm - height_mm;
        self.place(img, MARGIN_MM, y, width_mm);
        self.y_mm += height_mm;
        Ok(())
    }

    /// Draw `img` with its bottom-left corner at (`x`, `y`) mm from the page's bottom-left.
    fn place(&self, img: &DynamicImage, x: f32, y: f32, width_mm: f32) {
        let (px_width, _) = img.dimensions();
        let native_width_mm = px_width as f32 / IMAGE_DPI * 25.4;
        let scale = width_mm / native_width_mm;

        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    fn finish(self, out_path: &Path) -> JournalResult<usize> {
        let file = File::create(out_path).map_err(|e| JournalError::write(out_path, e))?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| JournalError::write(out_path, e))?;
        Ok(self.pages)
    }
}

/// Scale to `width_mm`, shrinking further if the height would exceed `max_height_mm`.
fn fit(img: &DynamicImage, width_mm: f32, max_height_mm: f32) -> JournalResult<(f32, f32)> {
    let (px_width, px_height) = img.dimensions();
    if px_width == 0 || px_height == 0 {
        return Err(JournalError::Render("image has zero size".into()));
    }
    let aspect = px_height as f32 / px_width as f32;
    let height_mm = width_mm * aspect;
    if height_mm > max_height_mm {
        Ok((max_height_mm / aspect, max_height_mm))
    } else {
        Ok((width_mm, height_mm))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
