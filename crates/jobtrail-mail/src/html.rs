//! HTML body reduction to plain text.
//!
//! Job boards and recruiting tools send heavily templated HTML. The
//! stripper here keeps only human-visible text: `<script>` and `<style>`
//! elements vanish with their contents, anchors contribute their visible
//! text but never their target, images contribute nothing, and whitespace
//! runs collapse to single spaces.

/// Converts an HTML fragment to plain text.
///
/// Tag boundaries become whitespace so adjacent block elements do not run
/// together; the final pass collapses all whitespace runs and trims.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    // ASCII lowercasing preserves byte offsets, so tag scanning runs over
    // the lowered copy while text slices come from the original.
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len() / 2);
    let mut pos = 0usize;

    while pos < html.len() {
        let Some(rel) = lower[pos..].find('<') else {
            out.push_str(&html[pos..]);
            break;
        };
        let start = pos + rel;
        out.push_str(&html[pos..start]);

        if lower[start..].starts_with("<!--") {
            pos = lower[start..]
                .find("-->")
                .map_or(html.len(), |j| start + j + 3);
            continue;
        }

        let Some(gt_rel) = lower[start..].find('>') else {
            // Unterminated tag: nothing visible follows.
            break;
        };
        let gt = start + gt_rel;
        let name = tag_name(&lower[start + 1..gt]);
        pos = gt + 1;

        if name == "script" || name == "style" {
            let close = format!("</{name}");
            if let Some(close_rel) = lower[pos..].find(&close) {
                let close_start = pos + close_rel;
                pos = lower[close_start..]
                    .find('>')
                    .map_or(html.len(), |j| close_start + j + 1);
            } else {
                pos = html.len();
            }
        } else {
            // Every other tag, opening or closing, is a soft break. This
            // drops anchor hrefs and image sources while keeping any text
            // between the tags.
            out.push(' ');
        }
    }

    collapse_whitespace(&decode_entities(&out))
}

/// Extracts the element name from the inside of a tag.
fn tag_name(tag_body: &str) -> &str {
    tag_body
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
}

/// Decodes the character references that show up in mail templates.
///
/// Unrecognized references pass through untouched.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // A reference is at most a few characters before its semicolon.
        let semi = rest.find(';').filter(|&i| i <= 10);
        let Some(semi) = semi else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => decode_numeric_entity(entity),
        };

        if let Some(c) = decoded {
            out.push(c);
            rest = &rest[semi + 1..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Decodes `#NNN` and `#xHH` character references.
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

/// Collapses whitespace runs to single spaces and trims the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
