//! PDF report rendering for the assistant's latest reply.
//!
//! ## Layout
//!
//! A4 portrait. A centred bold title, a centred italic timestamp, then the
//! reply as body text wrapped to the page width. Body text flows onto as
//! many pages as it needs.
//!
//! ## Fonts and encoding
//!
//! Only the standard-14 Courier faces are used, so nothing is embedded and
//! no font files are needed at runtime. Courier is monospaced (every glyph
//! is 600/1000 em), which makes wrapping and centring exact.
//!
//! The standard fonts only cover a single-byte Latin alphabet. Before
//! rendering, every character above U+00FF is replaced by `?`. This is
//! lossy on purpose: non-Latin text in a reply comes out as question marks
//! in the exported file. Changing it changes output bytes.

use crate::error::ChatError;
use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::{debug, info};

/// MIME type of generated reports.
pub const REPORT_MIME: &str = "application/pdf";

/// Substitute for characters the report fonts cannot show.
pub const REPLACEMENT_CHAR: char = '?';

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
/// Courier advance width as a fraction of the font size.
const COURIER_ADVANCE: f32 = 0.6;

const TITLE_SIZE: f32 = 16.0;
const STAMP_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 14.0;

const FONT_BODY: &str = "F1";
const FONT_TITLE: &str = "F2";
const FONT_STAMP: &str = "F3";

/// A rendered report ready for download.
#[derive(Debug, Clone)]
pub struct Report {
    /// `ai_report_<YYYYMMDD_HHMMSS>.pdf`
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub generated_at: NaiveDateTime,
    pub page_count: usize,
}

impl Report {
    pub fn mime_type(&self) -> &'static str {
        REPORT_MIME
    }
}

/// Download name for a report generated at `at`.
pub fn report_file_name(at: &NaiveDateTime) -> String {
    format!("ai_report_{}.pdf", at.format("%Y%m%d_%H%M%S"))
}

/// True when `message` asks for a report.
pub fn wants_report(message: &str, keywords: &[String]) -> bool {
    let lower = message.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Replace every character above U+00FF with [`REPLACEMENT_CHAR`].
///
/// The C1 controls U+0080..=U+009F are replaced too: `WinAnsiEncoding`
/// draws those bytes as `€`, `‚` and friends. Tabs become four spaces and
/// carriage returns are dropped; the rest of Latin-1 passes through.
pub fn to_latin1_lossy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => {}
            '\t' => out.push_str("    "),
            '\u{80}'..='\u{9f}' => out.push(REPLACEMENT_CHAR),
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push(REPLACEMENT_CHAR),
        }
    }
    out
}

/// Encode Latin-1-safe text to the single bytes the PDF fonts expect.
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(REPLACEMENT_CHAR as u8))
        .collect()
}

/// Greedy word wrap to `max_chars` characters per line.
///
/// Blank source lines are kept as blank output lines; words longer than a
/// line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for source_line in text.split('\n') {
        if source_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        for word in source_line.split(' ').filter(|w| !w.is_empty()) {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        if current_len > 0 {
            lines.push(current);
        }
    }

    lines
}

/// One positioned line of text.
struct PlacedLine {
    font: &'static str,
    size: f32,
    x: f32,
    y: f32,
    text: Vec<u8>,
}

fn centred_x(text: &str, size: f32) -> f32 {
    let width = text.chars().count() as f32 * size * COURIER_ADVANCE;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
}

fn body_chars_per_line() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (BODY_SIZE * COURIER_ADVANCE)).floor() as usize
}

/// Lay the report out into pages of positioned lines.
fn layout(title: &str, stamp: &str, body: &str) -> Vec<Vec<PlacedLine>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];

    let title = to_latin1_lossy(title);
    let mut y = top - TITLE_SIZE;
    pages[0].push(PlacedLine {
        font: FONT_TITLE,
        size: TITLE_SIZE,
        x: centred_x(&title, TITLE_SIZE),
        y,
        text: latin1_bytes(&title),
    });

    y -= TITLE_SIZE + 6.0;
    pages[0].push(PlacedLine {
        font: FONT_STAMP,
        size: STAMP_SIZE,
        x: centred_x(stamp, STAMP_SIZE),
        y,
        text: latin1_bytes(stamp),
    });

    y -= STAMP_SIZE + 2.0 * BODY_LEADING;
    for line in wrap_text(&to_latin1_lossy(body), body_chars_per_line()) {
        if y < MARGIN {
            pages.push(Vec::new());
            y = top - BODY_SIZE;
        }
        if !line.is_empty() {
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine {
                    font: FONT_BODY,
                    size: BODY_SIZE,
                    x: MARGIN,
                    y,
                    text: latin1_bytes(&line),
                });
            }
        }
        y -= BODY_LEADING;
    }

    pages
}

fn page_content(lines: &[PlacedLine]) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(line.font.as_bytes().to_vec()), line.size.into()],
        ));
        operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.text.clone())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn courier(doc: &mut Document, base_font: &str) -> lopdf::ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Render `reply` into a PDF report generated at `at`.
pub fn render_report(title: &str, reply: &str, at: NaiveDateTime) -> Result<Report, ChatError> {
    let stamp = format!("Generated: {}", at.format("%Y-%m-%d %H:%M"));
    let pages = layout(title, &stamp, reply);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font = courier(&mut doc, "Courier");
    let title_font = courier(&mut doc, "Courier-Bold");
    let stamp_font = courier(&mut doc, "Courier-Oblique");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_BODY => body_font,
            FONT_TITLE => title_font,
            FONT_STAMP => stamp_font,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let encoded = page_content(lines)
            .encode()
            .map_err(|e| ChatError::ReportRender(format!("content encoding: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(latin1_bytes(&to_latin1_lossy(title))),
        "Producer" => Object::string_literal("edgequake-docchat"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ChatError::ReportRender(e.to_string()))?;

    debug!("Report laid out on {} pages", page_count);
    info!("Rendered report: {} bytes, {} pages", bytes.len(), page_count);

    Ok(Report {
        file_name: report_file_name(&at),
        bytes,
        generated_at: at,
        page_count,
    })
}
