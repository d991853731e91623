//! SMTP commands

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::smtp::authentication::{Credentials, Mechanism};

/// EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ehlo {
    client_id: String,
}

impl Display for Ehlo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        #[allow(clippy::write_with_newline)]
        write!(f, "EHLO {}\r\n", self.client_id)
    }
}

impl Ehlo {
    /// Creates a EHLO command
    pub fn new<S: Into<String>>(client_id: S) -> Ehlo {
        Ehlo {
            client_id: client_id.into(),
        }
    }
}

/// HELO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Helo {
    client_id: String,
}

impl Display for Helo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        #[allow(clippy::write_with_newline)]
        write!(f, "HELO {}\r\n", self.client_id)
    }
}

impl Helo {
    /// Creates a HELO command
    pub fn new<S: Into<String>>(client_id: S) -> Helo {
        Helo {
            client_id: client_id.into(),
        }
    }
}

/// EHLO when authentication follows, HELO otherwise
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Hello {
    /// Extended hello
    Ehlo(Ehlo),
    /// Plain hello
    Helo(Helo),
}

impl Hello {
    /// Picks the greeting command for the session
    pub fn new<S: Into<String>>(extended: bool, client_id: S) -> Hello {
        if extended {
            Hello::Ehlo(Ehlo::new(client_id))
        } else {
            Hello::Helo(Helo::new(client_id))
        }
    }
}

impl Display for Hello {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Hello::Ehlo(ehlo) => ehlo.fmt(f),
            Hello::Helo(helo) => helo.fmt(f),
        }
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Starttls;

impl Display for Starttls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: String,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>\r\n", self.sender)
    }
}

impl Mail {
    /// Creates a MAIL command
    pub fn new<S: Into<String>>(sender: S) -> Mail {
        Mail {
            sender: sender.into(),
        }
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: String,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    /// Creates an RCPT command
    pub fn new<S: Into<String>>(recipient: S) -> Rcpt {
        Rcpt {
            recipient: recipient.into(),
        }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Data;

impl Display for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Quit;

impl Display for Quit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}

/// AUTH command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Auth {
    mechanism: Mechanism,
}

impl Display for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AUTH {}\r\n", self.mechanism)
    }
}

impl Auth {
    /// Creates an AUTH command
    pub fn new(mechanism: Mechanism) -> Auth {
        Auth { mechanism }
    }
}

/// One base64 encoded line answering an AUTH challenge
#[derive(PartialEq, Eq, Clone)]
pub struct AuthResponse {
    encoded: String,
}

impl AuthResponse {
    /// Encodes the username
    pub fn username(credentials: &Credentials) -> AuthResponse {
        AuthResponse::encode(credentials.username())
    }

    /// Encodes the password
    pub fn password(credentials: &Credentials) -> AuthResponse {
        AuthResponse::encode(credentials.password())
    }

    fn encode(value: &str) -> AuthResponse {
        AuthResponse {
            encoded: STANDARD.encode(value.as_bytes()),
        }
    }
}

impl Display for AuthResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        #[allow(clippy::write_with_newline)]
        write!(f, "{}\r\n", self.encoded)
    }
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Ehlo::new("localhost")), "EHLO localhost\r\n");
        assert_eq!(format!("{}", Helo::new("localhost")), "HELO localhost\r\n");
        assert_eq!(
            format!("{}", Hello::new(true, "mx.local")),
            "EHLO mx.local\r\n"
        );
        assert_eq!(
            format!("{}", Hello::new(false, "mx.local")),
            "HELO mx.local\r\n"
        );
        assert_eq!(format!("{}", Starttls), "STARTTLS\r\n");
        assert_eq!(
            format!("{}", Mail::new("test@example.com")),
            "MAIL FROM:<test@example.com>\r\n"
        );
        assert_eq!(
            format!("{}", Rcpt::new("test@example.com")),
            "RCPT TO:<test@example.com>\r\n"
        );
        assert_eq!(format!("{}", Quit), "QUIT\r\n");
        assert_eq!(format!("{}", Data), "DATA\r\n");
        assert_eq!(format!("{}", Auth::new(Mechanism::Login)), "AUTH LOGIN\r\n");
    }

    #[test]
    fn test_auth_responses() {
        let credentials = Credentials::new("alice".to_owned(), "wonderland".to_owned());
        assert_eq!(
            AuthResponse::username(&credentials).to_string(),
            "YWxpY2U=\r\n"
        );
        assert_eq!(
            AuthResponse::password(&credentials).to_string(),
            "d29uZGVybGFuZA==\r\n"
        );
        assert_eq!(
            format!("{:?}", AuthResponse::password(&credentials)),
            "AuthResponse { .. }"
        );
    }
}
