//! SMTP client internals: the socket, TLS and the command/response loop

pub(crate) use self::connection::{check, SmtpConnection};
pub use self::{
    net::NetworkStream,
    tls::{Certificate, TlsParameters, TlsParametersBuilder},
};

mod connection;
mod net;
mod tls;

/// The codec used for transparency
///
/// Doubles a `.` found at the start of any line so that body content can
/// never be taken for the end-of-data marker.
#[derive(Debug, Clone, Copy)]
pub struct ClientCodec {
    at_line_start: bool,
}

impl Default for ClientCodec {
    fn default() -> Self {
        ClientCodec {
            at_line_start: true,
        }
    }
}

impl ClientCodec {
    /// Creates a new client codec
    pub fn new() -> Self {
        ClientCodec::default()
    }

    /// Adds transparency
    pub fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        let mut start = 0;
        for (idx, byte) in frame.iter().enumerate() {
            if self.at_line_start && *byte == b'.' {
                buf.extend_from_slice(&frame[start..idx]);
                buf.push(b'.');
                start = idx;
            }
            self.at_line_start = *byte == b'\n';
        }
        buf.extend_from_slice(&frame[start..]);
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
///
/// Used for debug displays
pub(crate) fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codec() {
        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];

        codec.encode(b"test\r\n", &mut buf);
        codec.encode(b".\r\n", &mut buf);
        codec.encode(b"\r\ntest", &mut buf);
        codec.encode(b"te\r\n.\r\nst", &mut buf);
        codec.encode(b"test", &mut buf);
        codec.encode(b"test.", &mut buf);
        codec.encode(b"test\n", &mut buf);
        codec.encode(b".test\n", &mut buf);
        codec.encode(b"test", &mut buf);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "test\r\n..\r\n\r\ntestte\r\n..\r\nsttesttest.test\n..test\ntest"
        );
    }

    #[test]
    fn test_codec_leading_dot() {
        let mut codec = ClientCodec::new();
        let mut buf: Vec<u8> = vec![];
        codec.encode(b".hidden\r\nvisible\r\n", &mut buf);
        assert_eq!(buf, b"..hidden\r\nvisible\r\n");
    }

    #[test]
    fn test_escape_crlf() {
        assert_eq!(escape_crlf("\r\n"), "<CRLF>");
        assert_eq!(escape_crlf("EHLO my_name\r\n"), "EHLO my_name<CRLF>");
        assert_eq!(
            escape_crlf("EHLO my_name\r\nSIZE 42\r\n"),
            "EHLO my_name<CRLF>SIZE 42<CRLF>"
        );
    }
}
