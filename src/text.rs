//! Text derivation helpers for mail bodies and snippets.
//!
//! All caps are measured in characters, not bytes, so truncation never
//! splits a UTF-8 sequence.

/// Maximum stored length of a plain text body.
pub const BODY_MAX_CHARS: usize = 5000;

/// Maximum stored length of an HTML body.
pub const HTML_BODY_MAX_CHARS: usize = 200_000;

/// Snippet length derived from the plain body.
pub const SNIPPET_MAX_CHARS: usize = 80;

/// Truncates to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives the list snippet from a plain text body.
pub fn snippet(body: &str) -> String {
    collapse_whitespace(&truncate_chars(body, SNIPPET_MAX_CHARS))
}

/// Caps an HTML body, appending a truncation marker when cut.
pub fn cap_html(html: &str) -> String {
    if html.chars().count() > HTML_BODY_MAX_CHARS {
        let mut capped = truncate_chars(html, HTML_BODY_MAX_CHARS);
        capped.push_str("...");
        capped
    } else {
        html.to_string()
    }
}

/// Roughly converts HTML to plain text: drops `<style>`/`<script>` blocks,
/// strips remaining tags, collapses whitespace, and caps the result.
///
/// Used for remote mail that only carries an HTML part. Not a sanitizer.
pub fn html_to_plain_text(html: &str, max_chars: usize) -> String {
    let without_blocks = strip_container(&strip_container(html, "style"), "script");

    let mut out = String::with_capacity(without_blocks.len().min(max_chars * 4));
    let mut in_tag = false;
    for c in without_blocks.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    truncate_chars(&collapse_whitespace(&out), max_chars)
}

/// Removes `<tag ...> ... </tag>` containers, case-insensitively.
fn strip_container(html: &str, tag: &str) -> String {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = find_ascii_ci(rest, &open) {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        match find_ascii_ci(after, &close) {
            Some(end) => rest = &after[end + close.len()..],
            None => {
                // Unclosed block swallows the rest of the document.
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
/// Matches always start at an ASCII byte, so offsets are char boundaries.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
