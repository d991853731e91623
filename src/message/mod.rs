//! Message envelope and MIME rendering
//!
//! An [`Envelope`] accumulates addresses, subject, bodies and attachment
//! paths. A [`Message`] renders one envelope into the header block and body
//! transmitted during the `DATA` phase.
//!
//! The body layout depends on what the envelope holds:
//!
//! * no attachments and no HTML body: a single `text/plain` part
//! * an HTML body but no attachments: `multipart/alternative`, plain text
//!   first, then HTML
//! * attachments: `multipart/mixed`, plain text first, HTML when set, then one
//!   base64 part per readable attachment
//!
//! ```rust
//! use postie::message::{Envelope, Message};
//!
//! let mut envelope = Envelope::new();
//! envelope
//!     .set_from(("nobody@domain.tld", "NoBody"))
//!     .add_to("hei@domain.tld")
//!     .add_bcc("audit@domain.tld")
//!     .set_subject("Happy new year")
//!     .set_text("Be happy!");
//!
//! let message = Message::new(&envelope).formatted();
//! assert!(message.starts_with("From: NoBody <nobody@domain.tld>\r\n"));
//! assert!(!message.contains("audit@domain.tld"));
//! assert!(message.ends_with("\r\n.\r\n"));
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

pub use self::{
    date::Date,
    mimebody::{make_boundary, MultiPartKind},
};
use self::mimebody::{attachment_part, delimiter, text_part, PREAMBLE};
use crate::address::{Address, Addresses};

pub mod body;
mod date;
pub mod encoder;
mod mimebody;

/// Charset declared for the subject and the text parts
pub const CHARSET: &str = "UTF-8";
/// Transfer encoding declared for the text parts
pub const TEXT_ENCODING: &str = "8bit";

const CRLF: &str = "\r\n";

/// Sender, recipients and content of one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    from: Address,
    reply_to: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: String,
    text: String,
    html: String,
    attachments: Vec<PathBuf>,
}

impl Envelope {
    /// Creates an empty envelope
    pub fn new() -> Self {
        Envelope::default()
    }

    /// Sets the `From` address, replacing any previous one
    pub fn set_from<A: Into<Address>>(&mut self, from: A) -> &mut Self {
        self.from = from.into();
        self
    }

    /// Sets the `Reply-To` address, replacing any previous one
    pub fn set_reply_to<A: Into<Address>>(&mut self, reply_to: A) -> &mut Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Appends `To` recipients
    ///
    /// Addresses without an email are skipped, here and in
    /// [`add_cc`](Envelope::add_cc) and [`add_bcc`](Envelope::add_bcc).
    pub fn add_to<A: Into<Addresses>>(&mut self, to: A) -> &mut Self {
        push_recipients(&mut self.to, to.into(), "To");
        self
    }

    /// Appends `CC` recipients
    pub fn add_cc<A: Into<Addresses>>(&mut self, cc: A) -> &mut Self {
        push_recipients(&mut self.cc, cc.into(), "Cc");
        self
    }

    /// Appends blind recipients, never rendered in a header
    pub fn add_bcc<A: Into<Addresses>>(&mut self, bcc: A) -> &mut Self {
        push_recipients(&mut self.bcc, bcc.into(), "Bcc");
        self
    }

    /// Sets the subject, as given
    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain text body, as given
    pub fn set_text<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.text = text.into();
        self
    }

    /// Sets the HTML body, as given
    pub fn set_html<S: Into<String>>(&mut self, html: S) -> &mut Self {
        self.html = html.into();
        self
    }

    /// Appends a file to attach, read when the message is rendered
    pub fn add_attachment<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.attachments.push(path.into());
        self
    }

    /// The `From` address
    pub fn from(&self) -> &Address {
        &self.from
    }

    /// The `Reply-To` address, `From` when unset
    pub fn reply_to(&self) -> &Address {
        self.reply_to.as_ref().unwrap_or(&self.from)
    }

    /// `To` recipients
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// `CC` recipients
    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    /// Blind recipients
    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    /// Every recipient, `To` then `CC` then `BCC`
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// The subject, unencoded
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain text body
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The HTML body, empty when unset
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Attached file paths
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }
}

/// Rendering of an [`Envelope`] with a fixed boundary and date
#[derive(Debug, Clone)]
pub struct Message<'a> {
    envelope: &'a Envelope,
    boundary: String,
    date: Date,
}

impl<'a> Message<'a> {
    /// Prepares `envelope` for rendering with a random boundary and the current date
    pub fn new(envelope: &'a Envelope) -> Self {
        Message {
            envelope,
            boundary: make_boundary(),
            date: Date::now(),
        }
    }

    /// Uses the given boundary
    pub fn boundary<S: Into<String>>(mut self, boundary: S) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Uses the given date
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Header lines shared by every body layout
    pub fn headers(&self) -> Vec<String> {
        let envelope = self.envelope;
        let mut headers = vec![
            format!("From: {}", envelope.from()),
            format!("Reply-To: {}", envelope.reply_to()),
            format!("Subject: {}", encoder::encode_word(envelope.subject(), CHARSET)),
            format!("Date: {}", self.date),
        ];

        if !envelope.to().is_empty() {
            headers.push(format!("To: {}", join_addresses(envelope.to())));
        }
        if !envelope.cc().is_empty() {
            headers.push(format!("CC: {}", join_addresses(envelope.cc())));
        }

        headers
    }

    /// Header and body lines, without the terminating `.` line
    pub fn lines(&self) -> Vec<String> {
        let envelope = self.envelope;
        let mut lines = self.headers();
        let text = text_part(&mime::TEXT_PLAIN, CHARSET, TEXT_ENCODING, envelope.text());
        let html = text_part(&mime::TEXT_HTML, CHARSET, TEXT_ENCODING, envelope.html());

        if envelope.attachments().is_empty() {
            if envelope.html().is_empty() {
                lines.extend(text);
            } else {
                self.open_multipart(&mut lines, MultiPartKind::Alternative);
                lines.extend(text);
                lines.push(delimiter(&self.boundary));
                lines.extend(html);
                lines.push(format!("{}--", delimiter(&self.boundary)));
            }
            return lines;
        }

        self.open_multipart(&mut lines, MultiPartKind::Mixed);
        lines.extend(text);
        lines.push(delimiter(&self.boundary));

        if !envelope.html().is_empty() {
            lines.extend(html);
            lines.push(delimiter(&self.boundary));
        }

        for path in envelope.attachments() {
            if let Some((filename, content)) = read_attachment(path) {
                lines.extend(attachment_part(&filename, encoder::base64_lines(&content)));
                lines.push(delimiter(&self.boundary));
            }
        }

        if let Some(last) = lines.last_mut() {
            last.push_str("--");
        }
        lines
    }

    /// Headers and body joined with CRLF, without the terminating `.` line
    pub fn content(&self) -> String {
        join_lines(self.lines())
    }

    /// Headers and body joined with CRLF, ending with the `.` line
    pub fn formatted(&self) -> String {
        let mut lines = self.lines();
        lines.push(".".to_owned());
        join_lines(lines)
    }

    fn open_multipart(&self, lines: &mut Vec<String>, kind: MultiPartKind) {
        lines.push("MIME-Version: 1.0".to_owned());
        lines.push(format!("Content-Type: {}", kind.content_type(&self.boundary)));
        lines.push(String::new());
        lines.push(PREAMBLE.to_owned());
        lines.push(delimiter(&self.boundary));
    }
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + CRLF.len()).sum());
    for line in lines {
        out.push_str(&line);
        out.push_str(CRLF);
    }
    out
}

/// Reads an attachment, `None` when missing, unreadable or empty
fn read_attachment(path: &Path) -> Option<(String, Vec<u8>)> {
    let content = match fs::read(path) {
        Ok(content) if !content.is_empty() => content,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "skipping empty attachment");
            return None;
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), "skipping attachment: {err}");
            return None;
        }
    };

    let filename = path.file_name()?.to_string_lossy().into_owned();
    Some((filename, content))
}

fn push_recipients(list: &mut Vec<Address>, addresses: Addresses, field: &str) {
    for address in addresses.into_vec() {
        if address.is_empty() {
            tracing::warn!(field, "skipping recipient without an email address");
            continue;
        }
        list.push(address);
    }
}

#[cfg(test)]
mod test {
    use std::{
        path::PathBuf,
        time::{Duration, SystemTime},
    };

    use pretty_assertions::assert_eq;

    use super::*;

    const BOUNDARY: &str = "0123456789abcdef";

    fn date() -> Date {
        Date::new(SystemTime::UNIX_EPOCH + Duration::from_secs(784887151))
    }

    fn envelope() -> Envelope {
        let mut envelope = Envelope::new();
        envelope
            .set_from(("nobody@domain.tld", "NoBody"))
            .add_to(["hei@domain.tld", "hallo@domain.tld"])
            .add_cc(("copy@domain.tld", "Copy"))
            .add_bcc("hidden@domain.tld")
            .set_subject("Happy new year")
            .set_text("Be happy!");
        envelope
    }

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "postie-message-{}-{}",
            std::process::id(),
            fastrand::u64(..)
        ));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const HEADERS: &str = concat!(
        "From: NoBody <nobody@domain.tld>\r\n",
        "Reply-To: NoBody <nobody@domain.tld>\r\n",
        "Subject: =?UTF-8?B?SGFwcHkgbmV3IHllYXI=?=\r\n",
        "Date: Tue, 15 Nov 1994 08:12:31 -0000\r\n",
        "To: <hei@domain.tld>, <hallo@domain.tld>\r\n",
        "CC: Copy <copy@domain.tld>\r\n",
    );

    #[test]
    fn plain_text_only() {
        let envelope = envelope();
        let message = Message::new(&envelope).boundary(BOUNDARY).date(date());

        assert_eq!(
            message.formatted(),
            [
                HEADERS,
                "Content-Type: text/plain; charset=\"UTF-8\"\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "Be happy!\r\n",
                ".\r\n",
            ]
            .concat()
        );
        assert!(!message.content().contains(BOUNDARY));
        assert!(!message.content().contains("MIME-Version"));
    }

    #[test]
    fn empty_recipient_headers_are_omitted() {
        let mut envelope = Envelope::new();
        envelope
            .set_from("nobody@domain.tld")
            .set_reply_to(("support@domain.tld", "Support"))
            .add_bcc("hidden@domain.tld");
        let headers = Message::new(&envelope).date(date()).headers();

        assert_eq!(
            headers,
            vec![
                "From: <nobody@domain.tld>",
                "Reply-To: Support <support@domain.tld>",
                "Subject: =?UTF-8?B??=",
                "Date: Tue, 15 Nov 1994 08:12:31 -0000",
            ]
        );
    }

    #[test]
    fn html_is_alternative() {
        let mut envelope = envelope();
        envelope.set_html("<p>Be <b>happy</b>!</p>");
        let message = Message::new(&envelope).boundary(BOUNDARY).date(date());

        assert_eq!(
            message.formatted(),
            [
                HEADERS,
                "MIME-Version: 1.0\r\n",
                "Content-Type: multipart/alternative; boundary=\"0123456789abcdef\"\r\n",
                "\r\n",
                "This is a multi-part message in MIME format.\r\n",
                "--0123456789abcdef\r\n",
                "Content-Type: text/plain; charset=\"UTF-8\"\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "Be happy!\r\n",
                "--0123456789abcdef\r\n",
                "Content-Type: text/html; charset=\"UTF-8\"\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "<p>Be <b>happy</b>!</p>\r\n",
                "--0123456789abcdef--\r\n",
                ".\r\n",
            ]
            .concat()
        );
    }

    #[test]
    fn attachments_are_mixed() {
        let present = temp_file("report.txt", b"quarterly numbers");
        let missing = present.with_file_name("missing.pdf");

        let mut envelope = envelope();
        envelope.add_attachment(&missing).add_attachment(&present);
        let message = Message::new(&envelope).boundary(BOUNDARY).date(date());

        assert_eq!(
            message.formatted(),
            [
                HEADERS,
                "MIME-Version: 1.0\r\n",
                "Content-Type: multipart/mixed; boundary=\"0123456789abcdef\"\r\n",
                "\r\n",
                "This is a multi-part message in MIME format.\r\n",
                "--0123456789abcdef\r\n",
                "Content-Type: text/plain; charset=\"UTF-8\"\r\n",
                "Content-Transfer-Encoding: 8bit\r\n",
                "\r\n",
                "Be happy!\r\n",
                "--0123456789abcdef\r\n",
                "Content-Type: application/octet-stream; name=\"report.txt\"\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "Content-Disposition: attachment; filename=\"report.txt\"\r\n",
                "\r\n",
                "cXVhcnRlcmx5IG51bWJlcnM=\r\n",
                "\r\n",
                "--0123456789abcdef--\r\n",
                ".\r\n",
            ]
            .concat()
        );
        assert!(!message.content().contains("missing.pdf"));

        fs::remove_file(present).unwrap();
    }

    #[test]
    fn attachments_with_html() {
        let first = temp_file("a.bin", &[0u8, 1, 2, 3]);
        let empty = temp_file("empty.bin", b"");

        let mut envelope = envelope();
        envelope
            .set_html("<p>hi</p>")
            .add_attachment(&first)
            .add_attachment(&empty);
        let content = Message::new(&envelope).boundary(BOUNDARY).content();

        assert_eq!(content.matches("--0123456789abcdef\r\n").count(), 3);
        assert!(content.ends_with("--0123456789abcdef--\r\n"));
        assert!(content.contains("Content-Type: text/html; charset=\"UTF-8\"\r\n"));
        assert!(content.contains("name=\"a.bin\""));
        assert!(!content.contains("empty.bin"));

        let text_at = content.find("text/plain").unwrap();
        let html_at = content.find("text/html").unwrap();
        let file_at = content.find("application/octet-stream").unwrap();
        assert!(text_at < html_at && html_at < file_at);

        fs::remove_file(first).unwrap();
        fs::remove_file(empty).unwrap();
    }

    #[test]
    fn only_missing_attachments() {
        let mut envelope = envelope();
        envelope.add_attachment("/nonexistent/postie/file.txt");
        let content = Message::new(&envelope).boundary(BOUNDARY).content();

        assert!(content.contains("multipart/mixed"));
        assert!(content.ends_with("Be happy!\r\n--0123456789abcdef--\r\n"));
    }

    #[test]
    fn bcc_never_rendered() {
        let mut envelope = envelope();
        envelope.set_html("<p>hi</p>");
        let formatted = Message::new(&envelope).formatted();
        assert!(!formatted.contains("hidden@domain.tld"));
        assert!(!formatted.contains("BCC:"));
    }

    #[test]
    fn subject_round_trip() {
        let mut envelope = envelope();
        envelope.set_subject("Relatório de vendas ☺");
        let headers = Message::new(&envelope).headers();
        let subject = headers[2].strip_prefix("Subject: ").unwrap();
        assert_eq!(
            encoder::decode_word(subject).as_deref(),
            Some("Relatório de vendas ☺")
        );
    }

    #[test]
    fn recipients_order() {
        let mut envelope = envelope();
        envelope.add_to("late@domain.tld");
        let emails: Vec<&str> = envelope.recipients().map(Address::email).collect();
        assert_eq!(
            emails,
            vec![
                "hei@domain.tld",
                "hallo@domain.tld",
                "late@domain.tld",
                "copy@domain.tld",
                "hidden@domain.tld",
            ]
        );
    }

    #[test]
    fn recipients_without_email_are_skipped() {
        let mut envelope = envelope();
        envelope
            .add_to(["", "late@domain.tld"])
            .add_cc(("", "Nobody"))
            .add_bcc("");

        assert_eq!(envelope.to().len(), 3);
        assert!(envelope.recipients().all(|address| !address.is_empty()));

        let headers = Message::new(&envelope).date(date()).headers();
        assert!(headers
            .contains(&"To: <hei@domain.tld>, <hallo@domain.tld>, <late@domain.tld>".to_owned()));
        assert!(headers.contains(&"CC: Copy <copy@domain.tld>".to_owned()));
    }
}
