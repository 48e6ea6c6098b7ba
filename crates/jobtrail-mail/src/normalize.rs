//! Payload normalization.
//!
//! Reduces a raw payload part tree to a single plain-text string for
//! classification and storage. The rules favor the plain-text rendition a
//! sender provides, falling back to processed HTML only when the plain
//! branch is a near-empty stub.

use crate::html::html_to_text;
use crate::payload::MessagePart;

/// A `multipart/alternative` plain branch shorter than this is treated as
/// a stub and loses to a present HTML branch.
const PLAIN_STUB_THRESHOLD: usize = 50;

/// Normalizes an optional top-level payload.
///
/// A missing payload yields the empty string; it is not an error.
#[must_use]
pub fn normalize_message(payload: Option<&MessagePart>) -> String {
    payload.map(normalize_part).unwrap_or_default()
}

/// Normalizes one payload part to plain text.
///
/// - `text/plain` decodes verbatim, trimmed
/// - `text/html` is stripped to visible text
/// - `multipart/alternative` picks between the plain and HTML branches
/// - any other `multipart/*` concatenates its distinct child texts
/// - anything else (attachments, images) contributes nothing
#[must_use]
pub fn normalize_part(part: &MessagePart) -> String {
    if part.is_text_plain() {
        return part
            .decoded_text()
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
    }

    if part.is_text_html() {
        return part
            .decoded_text()
            .map(|h| html_to_text(&h))
            .unwrap_or_default();
    }

    if part.is_alternative() {
        return normalize_alternative(part);
    }

    if part.is_multipart() {
        return concat_children(part);
    }

    String::new()
}

/// Picks between the plain and HTML branches of a `multipart/alternative`.
fn normalize_alternative(part: &MessagePart) -> String {
    let plain = part
        .parts
        .iter()
        .find(|p| p.is_text_plain())
        .map(normalize_part);
    let html = part
        .parts
        .iter()
        .find(|p| p.is_text_html())
        .map(normalize_part);

    match (plain, html) {
        (Some(p), Some(h)) => {
            if p.chars().count() < PLAIN_STUB_THRESHOLD {
                h
            } else {
                p
            }
        }
        (Some(p), None) => p,
        (None, Some(h)) => h,
        // Neither direct branch decodes as text; fall back to walking
        // whatever children exist (nested containers).
        (None, None) => concat_children(part),
    }
}

/// Concatenates the distinct normalized texts of a container's children,
/// newline-separated, in document order. Byte-identical chunks are emitted
/// once so repeated boilerplate signatures do not stack up.
fn concat_children(part: &MessagePart) -> String {
    let mut chunks: Vec<String> = Vec::new();
    for child in &part.parts {
        let text = normalize_part(child);
        if text.is_empty() || chunks.contains(&text) {
            continue;
        }
        chunks.push(text);
    }
    chunks.join("\n")
}
