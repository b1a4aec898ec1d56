// Clean OCR text before it is embedded in the reasoning prompt.
// Removes invisible Unicode, normalizes whitespace, caps the length.

/// Maximum OCR text length forwarded to the reasoning service (characters).
pub const MAX_CONTEXT_CHARS: usize = 50_000;

/// Sanitize recognized text for prompt embedding.
pub fn sanitize_ocr_text(raw: &str) -> String {
    let cleaned = remove_invisible_chars(raw);
    let normalized = normalize_whitespace(&cleaned);
    truncate_chars(&normalized, MAX_CONTEXT_CHARS)
}

/// Remove zero-width, bidi-control and other control characters.
/// Preserves standard whitespace (space, newline, tab).
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

/// Collapse runs of spaces/tabs, trim line ends, and cap blank lines at one.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&collapsed);
        out.push('\n');
    }

    out.trim().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            tracing::debug!(max_chars, "OCR text truncated for prompt");
            text[..byte_idx].to_string()
        }
        None => text.to_string(),
    }
}
