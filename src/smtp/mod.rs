//! The SMTP session sends one message over one connection.
//!
//! The client speaks the protocol itself, following
//! [RFC 5321](https://tools.ietf.org/html/rfc5321) as far as a single
//! submission needs it:
//!
//! * `HELO`, or `EHLO` when authentication is required
//! * STARTTLS ([RFC 2487](http://tools.ietf.org/html/rfc2487)), or TLS from
//!   the start of the connection
//! * AUTH ([RFC 4954](http://tools.ietf.org/html/rfc4954)) with the LOGIN
//!   mechanism
//!
//! A [`Session`] is configured with builder calls, then consumed by
//! [`Session::send`]. The connection is closed with `QUIT` whatever the
//! outcome, and the debug transcript, when enabled, is replayed afterwards.
//!
//! #### Checkpoints
//!
//! Some replies must carry a specific code for the dialog to go on:
//!
//! | Step                        | Required code |
//! |-----------------------------|---------------|
//! | server greeting             | `220`         |
//! | `STARTTLS`                  | `220`         |
//! | `EHLO` after `STARTTLS`     | `250` or `220`|
//! | `EHLO` before `AUTH`        | `250`         |
//! | `AUTH LOGIN`                | `334`         |
//! | username                    | `334`         |
//! | password                    | `235`         |
//! | end of message data         | `250`         |
//!
//! Replies to `HELO`, `MAIL FROM`, `RCPT TO` and `DATA` are read and recorded
//! but not checked; the final reply to the message data decides the outcome.
//!
//! #### Example
//!
//! ```rust,no_run
//! use postie::{Config, ConnectionProfile, Security, Session};
//!
//! # fn main() -> Result<(), postie::Error> {
//! let mut profile = ConnectionProfile::new("smtp.example.com", 465);
//! profile.security = Security::Ssl;
//! profile.auth_required = true;
//! profile.user = "user".into();
//! profile.pass = "secret".into();
//! profile.from = "noreply@example.com".into();
//! profile.sender = "Example".into();
//!
//! let config = Config::new()
//!     .with_profile("primary", profile)
//!     .with_default("primary");
//!
//! let mut session = Session::with_config(config)?;
//! session
//!     .to(vec![("alice@example.org", "Alice"), ("bob@example.org", "Bob")])
//!     .subject("Hello")
//!     .html_body("<p>Hello!</p>")
//!     .text_body("Hello!")
//!     .debug(true);
//!
//! let response = session.try_send()?;
//! assert_eq!(response.code(), 250);
//! # Ok(())
//! # }
//! ```

use std::{
    fmt::{self, Debug, Formatter},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use self::{
    authentication::Mechanism,
    client::{check, SmtpConnection, TlsParameters},
    commands::{Auth, AuthResponse, Data, Ehlo, Hello, Mail, Rcpt, Starttls},
    error::{Checkpoint, Error},
    response::Response,
    transcript::{FileSink, Transcript, TracingSink, TranscriptSink},
};
use crate::{
    address::{Address, Addresses},
    config::{ambient_server_name, Config, ConnectionProfile, Security},
    message::{body, Envelope, Message},
};

pub mod authentication;
pub mod client;
pub mod commands;
pub mod error;
pub mod response;
pub mod transcript;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
///
/// Defined in [RFC8314](https://tools.ietf.org/html/rfc8314)
pub const SUBMISSIONS_PORT: u16 = 465;

/// Default timeout for opening the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One message, sent over one connection
///
/// Builder methods return `&mut Self` so they can be chained. The session is
/// consumed by [`send`](Session::send) or [`try_send`](Session::try_send).
pub struct Session {
    config: Arc<Config>,
    connection: ConnectionProfile,
    localhost: String,
    debug: bool,
    sink: Arc<dyn TranscriptSink>,
    connect_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
    tls_parameters: Option<TlsParameters>,
    envelope: Envelope,
}

impl Session {
    /// Creates a session without any profile loaded
    ///
    /// The connection has to be set with
    /// [`set_connection`](Session::set_connection) or
    /// [`use_profile`](Session::use_profile).
    pub fn new() -> Self {
        Session::blank(Arc::new(Config::new()), ambient_server_name)
    }

    /// Creates a session from `config`, with its default profile loaded
    ///
    /// Fails if a default profile is named but does not exist.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        Session::with_server_name(config, ambient_server_name)
    }

    /// Like [`with_config`](Session::with_config), reading the ambient
    /// server name from `server_name` when `config` has no `localhost`
    pub fn with_server_name<F>(config: Config, server_name: F) -> Result<Self, Error>
    where
        F: FnOnce() -> String,
    {
        Session::from_shared(Arc::new(config), server_name)
    }

    pub(crate) fn from_shared<F>(config: Arc<Config>, server_name: F) -> Result<Self, Error>
    where
        F: FnOnce() -> String,
    {
        let mut session = Session::blank(config, server_name);
        if !session.config.default.is_empty() {
            let name = session.config.default.clone();
            session.use_profile(&name)?;
        }
        Ok(session)
    }

    fn blank<F>(config: Arc<Config>, server_name: F) -> Self
    where
        F: FnOnce() -> String,
    {
        let localhost = match config.localhost() {
            Some(localhost) => localhost.to_owned(),
            None => server_name(),
        };

        Session {
            config,
            connection: ConnectionProfile::default(),
            localhost,
            debug: false,
            sink: Arc::new(TracingSink),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            command_timeout: None,
            tls_parameters: None,
            envelope: Envelope::new(),
        }
    }

    /// Loads a named connection profile
    ///
    /// Sets the server, security, credentials and the default `From` and
    /// `Reply-To` addresses.
    pub fn use_profile(&mut self, name: &str) -> Result<&mut Self, Error> {
        let profile = self.config.profile(name)?.clone();
        tracing::debug!(profile = name, host = %profile.host, "using connection profile");

        self.envelope.set_from(profile.default_from());
        if !profile.reply.is_empty() {
            self.envelope.set_reply_to(profile.default_reply_to());
        }
        self.connection = profile;
        Ok(self)
    }

    /// Sets the connection parameters directly
    pub fn set_connection<H, U, P>(
        &mut self,
        host: H,
        port: u16,
        security: Security,
        auth_required: bool,
        user: U,
        pass: P,
    ) -> &mut Self
    where
        H: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        self.connection.host = host.into();
        self.connection.port = port;
        self.connection.security = security;
        self.connection.auth_required = auth_required;
        self.connection.user = user.into();
        self.connection.pass = pass.into();
        self
    }

    /// Sets the sender, replacing the profile default
    pub fn from<A: Into<Address>>(&mut self, from: A) -> &mut Self {
        self.envelope.set_from(from);
        self
    }

    /// Sets the `Reply-To` address
    pub fn reply_to<A: Into<Address>>(&mut self, reply_to: A) -> &mut Self {
        self.envelope.set_reply_to(reply_to);
        self
    }

    /// Appends one or more `To` recipients
    pub fn to<A: Into<Addresses>>(&mut self, to: A) -> &mut Self {
        self.envelope.add_to(to);
        self
    }

    /// Appends one or more `CC` recipients
    pub fn cc<A: Into<Addresses>>(&mut self, cc: A) -> &mut Self {
        self.envelope.add_cc(cc);
        self
    }

    /// Appends one or more blind recipients
    pub fn bcc<A: Into<Addresses>>(&mut self, bcc: A) -> &mut Self {
        self.envelope.add_bcc(bcc);
        self
    }

    /// Sets the plain text body
    ///
    /// Markup tags are stripped and lines are wrapped at 70 columns.
    pub fn text_body<S: AsRef<str>>(&mut self, content: S) -> &mut Self {
        self.envelope.set_text(body::plain_text(content.as_ref()));
        self
    }

    /// Sets the HTML body
    ///
    /// The markup is kept as given, only line endings are turned into CRLF.
    pub fn html_body<S: AsRef<str>>(&mut self, content: S) -> &mut Self {
        self.envelope.set_html(body::crlf(content.as_ref()));
        self
    }

    /// Sets the subject
    pub fn subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.envelope.set_subject(subject);
        self
    }

    /// Appends a file to attach
    ///
    /// Files are read when the message is rendered. Missing, unreadable or
    /// empty files are skipped.
    pub fn attach<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.envelope.add_attachment(path);
        self
    }

    /// Appends several files to attach, in order
    pub fn attach_all<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.envelope.add_attachment(path);
        }
        self
    }

    /// Records the request/response transcript and replays it after sending
    pub fn debug(&mut self, enabled: bool) -> &mut Self {
        self.debug = enabled;
        self
    }

    /// Enables debugging and appends the transcript to the file at `path`
    pub fn debug_file_path<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.debug = true;
        self.sink = Arc::new(FileSink::new(path));
        self
    }

    /// Replays the transcript to `sink` instead of `tracing`
    pub fn sink(&mut self, sink: Arc<dyn TranscriptSink>) -> &mut Self {
        self.sink = sink;
        self
    }

    /// Overrides the name sent with `HELO`/`EHLO`
    pub fn set_localhost<S: Into<String>>(&mut self, localhost: S) -> &mut Self {
        self.localhost = localhost.into();
        self
    }

    /// Bounds every read and write after the connection is opened
    ///
    /// Defaults to `None`: a stalled server blocks the caller.
    pub fn command_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.command_timeout = timeout;
        self
    }

    /// Bounds opening the connection, 5 seconds by default
    pub fn connect_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.connect_timeout = timeout;
        self
    }

    /// Uses custom TLS parameters instead of trusting the webpki roots for the host
    pub fn tls_parameters(&mut self, tls_parameters: TlsParameters) -> &mut Self {
        self.tls_parameters = Some(tls_parameters);
        self
    }

    /// The sender address
    pub fn from_address(&self) -> &Address {
        self.envelope.from()
    }

    /// The name sent with `HELO`/`EHLO`
    pub fn localhost(&self) -> &str {
        &self.localhost
    }

    /// The message being built
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Sends the message and tells whether the server accepted it
    ///
    /// Connection and protocol failures are reported as `false`. Enable
    /// [`debug`](Session::debug) to see what happened.
    pub fn send(self) -> bool {
        match self.try_send() {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("message not sent: {err}");
                false
            }
        }
    }

    /// Sends the message, returning the final reply or the failure
    ///
    /// Fails without connecting when no sender address is set.
    pub fn try_send(self) -> Result<Response, Error> {
        if self.envelope.from().is_empty() {
            return Err(error::configuration("no sender address set"));
        }

        let tls_parameters = match self.connection.security {
            Security::None => None,
            Security::Ssl | Security::Tls => Some(match self.tls_parameters.clone() {
                Some(tls_parameters) => tls_parameters,
                None => TlsParameters::new(self.connection.host.clone())?,
            }),
        };
        let implicit_tls = match self.connection.security {
            Security::Ssl => tls_parameters.as_ref(),
            Security::None | Security::Tls => None,
        };

        let transcript = Transcript::new(self.debug);
        let mut connection = SmtpConnection::connect(
            (self.connection.host.as_str(), self.connection.port),
            self.connect_timeout,
            implicit_tls,
            transcript,
        )?;

        let result = match connection.set_timeout(self.command_timeout) {
            Ok(()) => self.transact(&mut connection, tls_parameters.as_ref()),
            Err(err) => Err(error::network(err)),
        };

        let transcript = connection.close();
        if self.debug {
            transcript.replay(self.sink.as_ref());
        }

        result
    }

    fn transact(
        &self,
        connection: &mut SmtpConnection,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<Response, Error> {
        check(connection.read_response()?, Checkpoint::Greeting, &[220])?;

        let hello = Hello::new(self.connection.auth_required, self.localhost.as_str());
        connection.command(&hello)?;

        if let (Security::Tls, Some(tls_parameters)) = (self.connection.security, tls_parameters) {
            connection.expect(Starttls, Checkpoint::Starttls, 220)?;
            connection.starttls(tls_parameters)?;

            let response = connection.command(Ehlo::new(self.localhost.as_str()))?;
            check(response, Checkpoint::TlsHello, &[250, 220])?;
        }

        if self.connection.auth_required {
            let credentials = self.connection.credentials();
            connection.expect(Ehlo::new(self.localhost.as_str()), Checkpoint::Ehlo, 250)?;
            connection.expect(Auth::new(Mechanism::Login), Checkpoint::AuthLogin, 334)?;
            connection.expect(
                AuthResponse::username(&credentials),
                Checkpoint::AuthUser,
                334,
            )?;
            connection.expect(
                AuthResponse::password(&credentials),
                Checkpoint::AuthPass,
                235,
            )?;
        }

        connection.command(Mail::new(self.envelope.from().email()))?;
        for recipient in self.envelope.recipients() {
            connection.command(Rcpt::new(recipient.email()))?;
        }
        connection.command(Data)?;

        let message = Message::new(&self.envelope).content();
        let response = connection.message(message.as_bytes())?;
        check(response, Checkpoint::Message, &[250])
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.connection.host)
            .field("port", &self.connection.port)
            .field("security", &self.connection.security)
            .field("auth_required", &self.connection.auth_required)
            .field("localhost", &self.localhost)
            .field("debug", &self.debug)
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}
