use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Read, Write},
    net::Shutdown,
    time::Duration,
};

use super::{escape_crlf, ClientCodec, NetworkStream, TlsParameters};
use crate::smtp::{
    commands::Quit,
    error::{self, Checkpoint, Error},
    response::{is_last_line, parse_response, Response},
    transcript::Transcript,
};

/// Upper bound for a single line read from the server
const RESPONSE_LINE_LIMIT: u64 = 4096;

/// Structure that implements the SMTP client
pub(crate) struct SmtpConnection {
    /// TCP stream between client and server
    stream: BufReader<NetworkStream>,
    /// Requests and responses, when debugging
    transcript: Transcript,
}

impl SmtpConnection {
    /// Opens the socket, encrypted from the start when `tls_parameters` is set
    ///
    /// Nothing is read from the server yet.
    pub(crate) fn connect(
        server: (&str, u16),
        connect_timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
        transcript: Transcript,
    ) -> Result<SmtpConnection, Error> {
        tracing::debug!("connecting to {}:{}", server.0, server.1);
        let stream = NetworkStream::connect(server, connect_timeout, tls_parameters)?;
        Ok(SmtpConnection {
            stream: BufReader::new(stream),
            transcript,
        })
    }

    /// Bounds every later read and write, `None` blocks indefinitely
    pub(crate) fn set_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        self.stream.get_mut().set_read_timeout(duration)?;
        self.stream.get_mut().set_write_timeout(duration)
    }

    /// Upgrades the plain connection to TLS
    pub(crate) fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        self.stream.get_mut().upgrade_tls(tls_parameters)?;
        tracing::debug!(
            encrypted = self.stream.get_ref().is_encrypted(),
            "connection upgraded"
        );
        Ok(())
    }

    /// Sends an SMTP command
    pub(crate) fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;
        self.read_response()
    }

    /// Sends an SMTP command and requires the reply to carry `code`
    pub(crate) fn expect<C: Display>(
        &mut self,
        command: C,
        checkpoint: Checkpoint,
        code: u16,
    ) -> Result<Response, Error> {
        let response = self.command(command)?;
        check(response, checkpoint, &[code])
    }

    /// Sends the message content followed by the end-of-data line
    pub(crate) fn message(&mut self, message: &[u8]) -> Result<Response, Error> {
        let mut codec = ClientCodec::new();
        let mut out_buf = Vec::with_capacity(message.len() + 5);
        codec.encode(message, &mut out_buf);
        out_buf.extend_from_slice(b".\r\n");
        self.write(out_buf.as_slice())?;

        self.read_response()
    }

    /// Sends QUIT, reads the reply and closes the socket
    ///
    /// Errors are ignored: the connection is going away either way.
    pub(crate) fn close(mut self) -> Transcript {
        if let Err(err) = self.command(Quit) {
            tracing::debug!("QUIT failed: {err}");
        }

        let _ = self.stream.get_ref().shutdown(Shutdown::Both);
        self.transcript
    }

    /// Writes a string to the server
    fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        self.transcript.request(string);
        self.stream
            .get_mut()
            .write_all(string)
            .map_err(error::network)?;
        self.stream.get_mut().flush().map_err(error::network)?;

        tracing::trace!("Wrote: {}", escape_crlf(&String::from_utf8_lossy(string)));
        Ok(())
    }

    /// Gets the SMTP response
    ///
    /// Lines are accumulated until one has a space as its fourth character.
    pub(crate) fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        loop {
            let mut line = String::new();
            let read = (&mut self.stream)
                .take(RESPONSE_LINE_LIMIT)
                .read_line(&mut line)
                .map_err(error::network)?;
            if read == 0 {
                break;
            }

            tracing::trace!("<< {}", escape_crlf(&line));
            buffer.push_str(&line);
            if is_last_line(&line) {
                break;
            }
        }

        if buffer.is_empty() {
            return Err(error::response("connection closed without a response"));
        }

        self.transcript.response(&buffer);
        parse_response(&buffer)
    }
}

/// Requires `response` to carry one of `codes`
pub(crate) fn check(
    response: Response,
    checkpoint: Checkpoint,
    codes: &[u16],
) -> Result<Response, Error> {
    if codes.contains(&response.code()) {
        Ok(response)
    } else {
        tracing::debug!(
            "unexpected reply {} at {checkpoint}, expected {codes:?}",
            response.code()
        );
        Err(error::rejected(
            checkpoint,
            response.code(),
            Some(response.message().collect::<Vec<_>>().join(" ")),
        ))
    }
}
