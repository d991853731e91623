//! Error and result type for SMTP sessions

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

use crate::BoxError;

// Inspired by https://github.com/seanmonstar/reqwest/blob/a8566383168c0ef06c21f38cbc9213af6ff6db31/src/error.rs

/// The Errors that may occur when configuring a session or sending an email
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the error comes from the session configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self.inner.kind, Kind::Configuration)
    }

    /// Returns true if the server answered a checkpoint with an unexpected code
    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.kind, Kind::Rejected { .. })
    }

    /// Returns true if a response could not be read
    pub fn is_response(&self) -> bool {
        matches!(self.inner.kind, Kind::Response)
    }

    /// Returns true if the error is from the underlying socket
    pub fn is_network(&self) -> bool {
        matches!(self.inner.kind, Kind::Network | Kind::Connection)
    }

    /// Returns true if the error is from TLS
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    /// Returns true if the error is caused by a timeout
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
                return matches!(
                    io_err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                );
            }

            source = err.source();
        }

        false
    }

    /// The checkpoint at which the server answered with an unexpected code
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self.inner.kind {
            Kind::Rejected { checkpoint, .. } => Some(checkpoint),
            _ => None,
        }
    }

    /// Returns the reply code, if the error was generated from a response
    pub fn status(&self) -> Option<u16> {
        match self.inner.kind {
            Kind::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// A point in the dialog where a specific reply code is required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// Server greeting, `220`
    Greeting,
    /// Reply to `STARTTLS`, `220`
    Starttls,
    /// Reply to the hello sent on the encrypted connection
    TlsHello,
    /// Reply to the `EHLO` preceding authentication, `250`
    Ehlo,
    /// Reply to `AUTH LOGIN`, `334`
    AuthLogin,
    /// Reply to the encoded username, `334`
    AuthUser,
    /// Reply to the encoded password, `235`
    AuthPass,
    /// Reply to the end of the message data, `250`
    Message,
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Checkpoint::Greeting => "greeting",
            Checkpoint::Starttls => "STARTTLS",
            Checkpoint::TlsHello => "hello after STARTTLS",
            Checkpoint::Ehlo => "EHLO",
            Checkpoint::AuthLogin => "AUTH LOGIN",
            Checkpoint::AuthUser => "AUTH LOGIN username",
            Checkpoint::AuthPass => "AUTH LOGIN password",
            Checkpoint::Message => "end of data",
        })
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Invalid session configuration, such as an unknown profile name
    Configuration,
    /// Unexpected reply code at a checkpoint
    Rejected { checkpoint: Checkpoint, code: u16 },
    /// Missing or unreadable response
    Response,
    /// Could not open the connection
    Connection,
    /// Underlying network i/o error
    Network,
    /// TLS error
    Tls,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("postie::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Configuration => f.write_str("configuration error")?,
            Kind::Response => f.write_str("response error")?,
            Kind::Connection => f.write_str("connection error")?,
            Kind::Network => f.write_str("network error")?,
            Kind::Tls => f.write_str("tls error")?,
            Kind::Rejected { checkpoint, code } => {
                write!(f, "unexpected reply {code} at {checkpoint}")?;
            }
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Configuration, Some(e))
}

pub(crate) fn rejected(checkpoint: Checkpoint, code: u16, message: Option<String>) -> Error {
    Error::new(Kind::Rejected { checkpoint, code }, message)
}

pub(crate) fn response<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Response, Some(e))
}

pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connection, Some(e))
}

pub(crate) fn network<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Network, Some(e))
}

pub(crate) fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls, Some(e))
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    #[test]
    fn rejected_carries_checkpoint_and_code() {
        let err = rejected(Checkpoint::AuthPass, 535, Some("bad credentials".into()));
        assert!(err.is_rejected());
        assert_eq!(err.checkpoint(), Some(Checkpoint::AuthPass));
        assert_eq!(err.status(), Some(535));
        assert_eq!(
            err.to_string(),
            "unexpected reply 535 at AUTH LOGIN password: bad credentials"
        );
    }

    #[test]
    fn timeout_is_found_in_sources() {
        let err = network(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(err.is_timeout());
        assert!(err.is_network());
        assert_eq!(err.status(), None);

        let err = network(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_timeout());
    }
}
