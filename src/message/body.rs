//! Plain text body normalisation

use std::sync::OnceLock;

use regex::Regex;

/// Column at which plain text bodies are wrapped
pub const WRAP_WIDTH: usize = 70;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<[^\s<>][^>]*(?:>|$)").expect("tag pattern is valid")
    })
}

/// Removes markup tags and comments
///
/// A `<` followed by whitespace is text, not the start of a tag.
pub fn strip_tags(content: &str) -> String {
    tag_pattern().replace_all(content, "").into_owned()
}

/// Wraps every line at `width` columns, breaking on spaces
///
/// Words longer than `width` are left whole. Lines are joined with CRLF.
pub fn wrap(content: &str, width: usize) -> String {
    content
        .split('\n')
        .map(|line| wrap_line(line.strip_suffix('\r').unwrap_or(line), width))
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;

    for (idx, word) in line.split(' ').enumerate() {
        let len = word.chars().count();
        if idx == 0 {
            column = len;
        } else if column + 1 + len > width {
            out.push_str("\r\n");
            column = len;
        } else {
            out.push(' ');
            column += 1 + len;
        }
        out.push_str(word);
    }

    out
}

/// Ends every line with CRLF, leaving the content otherwise untouched
pub fn crlf(content: &str) -> String {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Strips markup, then wraps at [`WRAP_WIDTH`]
pub fn plain_text(content: &str) -> String {
    wrap(&strip_tags(content), WRAP_WIDTH)
}
