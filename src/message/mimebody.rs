//! Multipart framing

use std::fmt::{Display, Formatter, Result as FmtResult};

use mime::Mime;

/// Length of generated boundaries
const BOUNDARY_LENGTH: usize = 40;

/// Preamble shown by clients that do not understand MIME
pub const PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Create a random MIME boundary.
pub fn make_boundary() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(BOUNDARY_LENGTH)
        .collect()
}

/// MIME multipart variants used for messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiPartKind {
    /// Mixed kind to combine unrelated content parts
    ///
    /// For example, the text body and file attachments.
    Mixed,

    /// Alternative kind to join several variants of same content
    ///
    /// Here, the plain text and HTML versions of the body.
    Alternative,
}

impl MultiPartKind {
    /// The `Content-Type` value for this kind with `boundary`
    pub fn content_type(self, boundary: &str) -> String {
        format!("{self}; boundary=\"{boundary}\"")
    }
}

impl Display for MultiPartKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            MultiPartKind::Mixed => "multipart/mixed",
            MultiPartKind::Alternative => "multipart/alternative",
        })
    }
}

/// Header and body lines of a textual part
pub(crate) fn text_part(mime: &Mime, charset: &str, encoding: &str, body: &str) -> [String; 4] {
    [
        format!("Content-Type: {mime}; charset=\"{charset}\""),
        format!("Content-Transfer-Encoding: {encoding}"),
        String::new(),
        body.to_owned(),
    ]
}

/// Header and body lines of a file attachment
pub(crate) fn attachment_part(filename: &str, encoded: String) -> [String; 5] {
    [
        format!(
            "Content-Type: {}; name=\"{filename}\"",
            mime::APPLICATION_OCTET_STREAM
        ),
        "Content-Transfer-Encoding: base64".to_owned(),
        format!("Content-Disposition: attachment; filename=\"{filename}\""),
        String::new(),
        encoded,
    ]
}

/// The line opening the next part
pub(crate) fn delimiter(boundary: &str) -> String {
    format!("--{boundary}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_make_boundary() {
        let mut boundaries = std::collections::HashSet::with_capacity(10);
        for _ in 0..1000 {
            boundaries.insert(make_boundary());
        }

        // Ensure there are no duplicates
        assert_eq!(1000, boundaries.len());

        // Ensure correct length
        for boundary in boundaries {
            assert_eq!(40, boundary.len());
            assert!(boundary.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            MultiPartKind::Alternative.content_type("abc"),
            "multipart/alternative; boundary=\"abc\""
        );
        assert_eq!(
            MultiPartKind::Mixed.content_type("abc"),
            "multipart/mixed; boundary=\"abc\""
        );
    }

    #[test]
    fn test_text_part() {
        assert_eq!(
            text_part(&mime::TEXT_HTML, "UTF-8", "8bit", "<b>hi</b>"),
            [
                "Content-Type: text/html; charset=\"UTF-8\"".to_owned(),
                "Content-Transfer-Encoding: 8bit".to_owned(),
                String::new(),
                "<b>hi</b>".to_owned(),
            ]
        );
    }
}
