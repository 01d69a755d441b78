use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::IgniteError;

#[cfg(feature = "tls")]
use openssl::ssl::SslStream;

pub enum Stream {
    Tcp(TcpStream),
    #[cfg(feature = "tls")]
    Tls(SslStream<TcpStream>),
}

impl Stream {
    pub(crate) fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), IgniteError> {
        match self {
            Stream::Tcp(ref mut conn) => conn.set_read_timeout(timeout)?,
            #[cfg(feature = "tls")]
            Stream::Tls(ref mut stream) => stream.get_ref().set_read_timeout(timeout)?,
        }
        Ok(())
    }

    pub(crate) fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<(), IgniteError> {
        match self {
            Stream::Tcp(ref mut conn) => conn.set_write_timeout(timeout)?,
            #[cfg(feature = "tls")]
            Stream::Tls(ref mut stream) => stream.get_ref().set_write_timeout(timeout)?,
        }
        Ok(())
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(ref mut stream) => stream.read(buf),
            #[cfg(feature = "tls")]
            Stream::Tls(ref mut stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(ref mut stream) => stream.write(buf),
            #[cfg(feature = "tls")]
            Stream::Tls(ref mut stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(ref mut stream) => stream.flush(),
            #[cfg(feature = "tls")]
            Stream::Tls(ref mut stream) => stream.flush(),
        }
    }
}
