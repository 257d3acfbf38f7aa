// PDF export of the filtered forms: a title line, a period line, then one
// text block per form record, wrapped and paginated.
//
// The byte layout is a minimal single-font PDF written by hand (catalog,
// page tree, Helvetica, one content stream per page, xref, trailer). PDF
// text strings are single-byte, which is where the Latin-1 sanitization
// requirement comes from: every block is transcoded before layout.
use crate::types::VisitForm;
use crate::window::DateWindow;
use thiserror::Error;

const FONT_SIZE: u32 = 12;
const LINE_HEIGHT: i32 = 14;
const PAGE_WIDTH: i32 = 595;
const PAGE_HEIGHT: i32 = 842;
const MARGIN: i32 = 50;
const WRAP_COLUMNS: usize = 90;

pub const EXPORT_FILENAME: &str = "resumen_formularios.pdf";
pub const PLACEHOLDER_LINE: &str = "Error en contenido especial";

/// A non-empty block had no Latin-1-representable characters at all.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("text cannot be represented in Latin-1")]
pub struct EncodingError;

/// Transcode to Latin-1 bytes, dropping characters outside the range.
///
/// Fails only when a non-empty input loses every character, in which case
/// the caller substitutes the placeholder block instead of dropping the
/// record.
pub fn sanitize_latin1(text: &str) -> Result<Vec<u8>, EncodingError> {
    let out: Vec<u8> = text
        .chars()
        .filter_map(|c| {
            let code = c as u32;
            (code <= 0xFF).then_some(code as u8)
        })
        .collect();
    if out.is_empty() && !text.is_empty() {
        return Err(EncodingError);
    }
    Ok(out)
}

/// One sanitized text block per input record, in input order. The block
/// count always equals the record count; a record whose text cannot be
/// transcoded at all becomes the fixed placeholder block.
pub(crate) fn build_blocks(forms: &[VisitForm]) -> Vec<Vec<u8>> {
    forms
        .iter()
        .map(|f| {
            let text = format!("{} - {} - {}", f.submitted_date(), f.client, f.activity);
            sanitize_latin1(&text).unwrap_or_else(|_| PLACEHOLDER_LINE.as_bytes().to_vec())
        })
        .collect()
}

/// Serialize the filtered forms into a complete PDF byte stream. Always
/// returns a full document covering every record; per-record encoding
/// trouble degrades to a placeholder block, never to a truncated file.
pub fn export(forms: &[VisitForm], window: &DateWindow) -> Vec<u8> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    lines.extend(wrap_line(b"Resumen de formularios"));
    let period = format!("Periodo: {} al {}", window.start, window.end);
    // The period line is ASCII by construction.
    lines.extend(wrap_line(period.as_bytes()));
    for block in build_blocks(forms) {
        lines.extend(wrap_line(&block));
    }
    layout_document(&lines)
}

// Hard wrap at the column limit so long activity descriptions flow onto
// continuation lines instead of running off the page.
fn wrap_line(line: &[u8]) -> Vec<Vec<u8>> {
    if line.is_empty() {
        return vec![Vec::new()];
    }
    line.chunks(WRAP_COLUMNS).map(|c| c.to_vec()).collect()
}

fn escape_pdf_string(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for &b in line {
        if b == b'(' || b == b')' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

fn page_content(lines: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(
        format!(
            "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
            FONT_SIZE,
            LINE_HEIGHT,
            MARGIN,
            PAGE_HEIGHT - MARGIN
        )
        .as_bytes(),
    );
    for line in lines {
        stream.extend_from_slice(b"(");
        stream.extend_from_slice(&escape_pdf_string(line));
        stream.extend_from_slice(b") Tj\nT*\n");
    }
    stream.extend_from_slice(b"ET\n");
    stream
}

// Assembles the object table: 1 catalog, 2 page tree, 3 font, then a page
// object and a content stream per page.
fn layout_document(lines: &[Vec<u8>]) -> Vec<u8> {
    let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT).max(1) as usize;
    let empty_page: &[Vec<u8>] = &[];
    let pages: Vec<&[Vec<u8>]> = if lines.is_empty() {
        vec![empty_page]
    } else {
        lines.chunks(lines_per_page).collect()
    };
    let page_count = pages.len();

    let mut objects: Vec<Vec<u8>> = Vec::new();
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + i * 2))
        .collect();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec());

    for (i, page_lines) in pages.iter().enumerate() {
        let content_id = 5 + i * 2;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, content_id
            )
            .into_bytes(),
        );
        let stream = page_content(page_lines);
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"endstream");
        objects.push(content);
    }

    let mut doc: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets: Vec<usize> = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(doc.len());
        doc.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        doc.extend_from_slice(obj);
        doc.extend_from_slice(b"\nendobj\n");
    }
    let xref_offset = doc.len();
    doc.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    doc.extend_from_slice(b"0000000000 65535 f \n");
    for off in &offsets {
        doc.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    doc.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    doc
}
