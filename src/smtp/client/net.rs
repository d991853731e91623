use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Read, Write},
    mem,
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use rustls::{ClientConnection, StreamOwned};

use super::TlsParameters;
use crate::smtp::error::{self, Error};

/// A network stream
pub struct NetworkStream {
    inner: InnerNetworkStream,
}

/// Represents the different types of underlying network streams
#[allow(clippy::large_enum_variant)]
enum InnerNetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    Tls(StreamOwned<ClientConnection, TcpStream>),
    /// Left in place while upgrading, or after a failed upgrade
    None,
}

impl NetworkStream {
    fn new(inner: InnerNetworkStream) -> Self {
        NetworkStream { inner }
    }

    /// Returns peer's address
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match &self.inner {
            InnerNetworkStream::Tcp(s) => s.peer_addr(),
            InnerNetworkStream::Tls(s) => s.get_ref().peer_addr(),
            InnerNetworkStream::None => Err(closed()),
        }
    }

    /// Shutdowns the connection
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match &self.inner {
            InnerNetworkStream::Tcp(s) => s.shutdown(how),
            InnerNetworkStream::Tls(s) => s.get_ref().shutdown(how),
            InnerNetworkStream::None => Ok(()),
        }
    }

    /// Opens a connection to the first reachable address of `server`
    ///
    /// `timeout` bounds each connection attempt. When `tls_parameters` is
    /// given, the stream is encrypted from the start and the handshake runs
    /// with the first read.
    pub fn connect<T: ToSocketAddrs>(
        server: T,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        fn try_connect<T: ToSocketAddrs>(
            server: T,
            timeout: Option<Duration>,
        ) -> Result<TcpStream, Error> {
            let addrs = server.to_socket_addrs().map_err(error::connection)?;
            let mut last_err = None;

            for addr in addrs {
                let attempt = match timeout {
                    Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                    None => TcpStream::connect(addr),
                };
                match attempt {
                    Ok(stream) => return Ok(stream),
                    Err(err) => last_err = Some(err),
                }
            }

            Err(match last_err {
                Some(last_err) => error::connection(last_err),
                None => error::connection("could not resolve to any supported address"),
            })
        }

        let tcp_stream = try_connect(server, timeout)?;
        let mut stream = NetworkStream::new(InnerNetworkStream::Tcp(tcp_stream));
        if let Some(tls_parameters) = tls_parameters {
            stream.upgrade_tls(tls_parameters)?;
        }
        Ok(stream)
    }

    /// Wraps the plain connection in TLS, acting as the client
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        let tcp_stream = match mem::replace(&mut self.inner, InnerNetworkStream::None) {
            InnerNetworkStream::Tcp(tcp_stream) => tcp_stream,
            other => {
                self.inner = other;
                return Ok(());
            }
        };

        self.inner = InnerNetworkStream::Tls(Self::upgrade_tls_impl(tcp_stream, tls_parameters)?);
        Ok(())
    }

    fn upgrade_tls_impl(
        tcp_stream: TcpStream,
        tls_parameters: &TlsParameters,
    ) -> Result<StreamOwned<ClientConnection, TcpStream>, Error> {
        let connection = ClientConnection::new(
            tls_parameters.connector.clone(),
            tls_parameters.server_name.clone(),
        )
        .map_err(error::tls)?;

        Ok(StreamOwned::new(connection, tcp_stream))
    }

    /// Tells if the stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        matches!(self.inner, InnerNetworkStream::Tls(_))
    }

    /// Set read timeout for IO calls
    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(stream) => stream.set_read_timeout(duration),
            InnerNetworkStream::Tls(stream) => stream.get_ref().set_read_timeout(duration),
            InnerNetworkStream::None => Ok(()),
        }
    }

    /// Set write timeout for IO calls
    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> io::Result<()> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(stream) => stream.set_write_timeout(duration),
            InnerNetworkStream::Tls(stream) => stream.get_ref().set_write_timeout(duration),
            InnerNetworkStream::None => Ok(()),
        }
    }
}

impl Debug for NetworkStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkStream")
            .field("encrypted", &self.is_encrypted())
            .finish_non_exhaustive()
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.read(buf),
            InnerNetworkStream::Tls(s) => s.read(buf),
            InnerNetworkStream::None => Err(closed()),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.write(buf),
            InnerNetworkStream::Tls(s) => s.write(buf),
            InnerNetworkStream::None => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.flush(),
            InnerNetworkStream::Tls(s) => s.flush(),
            InnerNetworkStream::None => Ok(()),
        }
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is not connected")
}
