//! Debug transcript of a session
//!
//! When debugging is enabled every request written to the server and every
//! response block read back is recorded, in order. The lines are replayed to
//! a [`TranscriptSink`] once the send attempt is over, whatever its outcome.

use std::{
    fmt::{self, Debug, Formatter},
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
};

use super::client::escape_crlf;

/// Receives transcript lines after a send attempt
pub trait TranscriptSink: Send + Sync {
    /// Records one line
    fn record(&self, line: &str);
}

/// Emits every line as a `tracing` event at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TranscriptSink for TracingSink {
    fn record(&self, line: &str) {
        tracing::debug!(target: "postie::transcript", "{line}");
    }
}

/// Appends every line to a file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink appending to `path`, created on first use
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileSink { path: path.into() }
    }
}

impl TranscriptSink for FileSink {
    fn record(&self, line: &str) {
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));

        if let Err(err) = written {
            tracing::warn!(path = %self.path.display(), "could not write transcript: {err}");
        }
    }
}

/// Ordered request and response lines of one session
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    enabled: bool,
    lines: Vec<String>,
}

impl Transcript {
    /// Creates a transcript, recording only when `enabled`
    pub fn new(enabled: bool) -> Self {
        Transcript {
            enabled,
            lines: Vec::new(),
        }
    }

    pub(crate) fn request(&mut self, request: &[u8]) {
        if self.enabled {
            self.lines.push(format!(
                "Request: {}",
                escape_crlf(&String::from_utf8_lossy(request))
            ));
        }
    }

    pub(crate) fn response(&mut self, response: &str) {
        if self.enabled {
            self.lines
                .push(format!("Response: {}", escape_crlf(response)));
        }
    }

    /// The recorded lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Replays every line, in order, to `sink`
    pub fn replay(&self, sink: &dyn TranscriptSink) {
        for line in &self.lines {
            sink.record(line);
        }
    }
}

impl Debug for Transcript {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("enabled", &self.enabled)
            .field("lines", &self.lines.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl TranscriptSink for Collect {
        fn record(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_owned());
        }
    }

    #[test]
    fn disabled_records_nothing() {
        let mut transcript = Transcript::new(false);
        transcript.request(b"EHLO me\r\n");
        transcript.response("250 ok\r\n");
        assert!(transcript.lines().is_empty());
    }

    #[test]
    fn replays_in_order() {
        let mut transcript = Transcript::new(true);
        transcript.response("220 ready\r\n");
        transcript.request(b"HELO me\r\n");
        transcript.response("250 hi\r\n");

        let sink = Collect::default();
        transcript.replay(&sink);
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![
                "Response: 220 ready<CRLF>",
                "Request: HELO me<CRLF>",
                "Response: 250 hi<CRLF>",
            ]
        );
    }

    #[test]
    fn file_sink_appends() {
        let path = std::env::temp_dir().join(format!(
            "postie-transcript-{}-{}.log",
            std::process::id(),
            fastrand::u64(..)
        ));
        let sink = FileSink::new(&path);
        sink.record("Request: QUIT<CRLF>");
        sink.record("Response: 221 bye<CRLF>");

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Request: QUIT<CRLF>\nResponse: 221 bye<CRLF>\n");
        std::fs::remove_file(path).unwrap();
    }
}
