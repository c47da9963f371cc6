use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Joins the non-blank paragraphs of the main document part with newlines.
pub(super) fn extract(bytes: &[u8]) -> Result<String, String> {
    let xml = read_document_part(bytes)?;
    let paragraphs = collect_paragraphs(&xml)?;

    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn read_document_part(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX package: {e}"))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("missing {DOCUMENT_PART}: {e}"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("unreadable {DOCUMENT_PART}: {e}"))?;
    Ok(xml)
}

/// Walks `w:p` elements in document order. A paragraph's slot is reserved when it
/// opens, so a host paragraph precedes the table or text-box paragraphs nested in it.
fn collect_paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
        };

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_text = true,
                _ => {}
            },
            // Tab stops in paragraph properties are also `w:tab`; only run-level ones count.
            // `w:softHyphen` is an optional break point and contributes nothing.
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if run_depth > 0 => push_text(&mut paragraphs, &open, "\t"),
                b"br" | b"cr" if run_depth > 0 => push_text(&mut paragraphs, &open, "\n"),
                b"noBreakHyphen" if run_depth > 0 => push_text(&mut paragraphs, &open, "-"),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    open.pop();
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| format!("bad text in {DOCUMENT_PART}: {e}"))?;
                push_text(&mut paragraphs, &open, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Appends to the innermost open paragraph; text outside any paragraph is dropped.
fn push_text(paragraphs: &mut [String], open: &[usize], text: &str) {
    if let Some(&index) = open.last() {
        paragraphs[index].push_str(text);
    }
}
