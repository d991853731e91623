//! Composes and sends messages from already rendered content
//!
//! A [`Mailer`] holds the configuration and creates a fresh [`Session`] for
//! every message, with the default profile loaded. The content is applied
//! first, then the caller configures addresses and attachments.
//!
//! ```rust,no_run
//! use postie::{Config, Content, Mailer};
//!
//! # fn main() -> Result<(), postie::Error> {
//! # let config = Config::new();
//! let mailer = Mailer::new(config);
//! let accepted = mailer.send(
//!     Content::Both {
//!         html: "<p>Welcome!</p>".into(),
//!         text: "Welcome!".into(),
//!     },
//!     |session| {
//!         session.to(("alice@example.org", "Alice")).subject("Welcome");
//!     },
//! )?;
//! # let _ = accepted;
//! # Ok(())
//! # }
//! ```

use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use crate::{
    config::{ambient_server_name, Config},
    smtp::{error::Error, transcript::TranscriptSink, Session},
};

/// Rendered body content of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// HTML body only
    Html(String),
    /// Plain text body only
    Text(String),
    /// Both bodies, sent as `multipart/alternative`
    Both {
        /// HTML body
        html: String,
        /// Plain text body
        text: String,
    },
    /// Raw content, used as the HTML body
    Raw(String),
}

impl Content {
    fn apply(self, session: &mut Session) {
        match self {
            Content::Html(html) | Content::Raw(html) => {
                session.html_body(html);
            }
            Content::Text(text) => {
                session.text_body(text);
            }
            Content::Both { html, text } => {
                session.html_body(html).text_body(text);
            }
        }
    }
}

impl From<&str> for Content {
    fn from(html: &str) -> Self {
        Content::Html(html.to_owned())
    }
}

impl From<String> for Content {
    fn from(html: String) -> Self {
        Content::Html(html)
    }
}

/// Creates one [`Session`] per message from a shared [`Config`]
#[derive(Clone)]
pub struct Mailer {
    config: Arc<Config>,
    sink: Option<Arc<dyn TranscriptSink>>,
}

impl Mailer {
    /// Creates a mailer for `config`
    pub fn new(config: Config) -> Self {
        Mailer {
            config: Arc::new(config),
            sink: None,
        }
    }

    /// Replays the transcript of every debugged session to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// A new session with the default profile loaded
    pub fn session(&self) -> Result<Session, Error> {
        let mut session = Session::from_shared(Arc::clone(&self.config), ambient_server_name)?;
        if let Some(sink) = &self.sink {
            session.sink(Arc::clone(sink));
        }
        Ok(session)
    }

    /// Applies `content`, lets `configure` finish the session, then sends it
    ///
    /// Configuration errors are returned; protocol failures are `Ok(false)`.
    pub fn send<C, F>(&self, content: C, configure: F) -> Result<bool, Error>
    where
        C: Into<Content>,
        F: FnOnce(&mut Session),
    {
        let mut session = self.session()?;
        content.into().apply(&mut session);
        configure(&mut session);
        Ok(session.send())
    }
}

impl Debug for Mailer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
