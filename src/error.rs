use std::borrow::Cow;
use std::error;
use std::fmt;
use std::io;
use std::string::FromUtf8Error;

/// Client-side errors, raised before anything is sent to the cluster.
#[derive(Debug, PartialEq)]
pub enum ClientError {
    /// The cache name may not be empty.
    EmptyCacheName,
    /// General client error.
    Error(Cow<'static, str>),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::EmptyCacheName => write!(f, "The cache name may not be empty"),
            ClientError::Error(s) => write!(f, "{}", s),
        }
    }
}

impl error::Error for ClientError {}

impl From<ClientError> for IgniteError {
    fn from(err: ClientError) -> Self {
        IgniteError::ClientError(err)
    }
}

/// Server responses that violate the thin client protocol.
#[derive(Debug, PartialEq)]
pub enum ServerError {
    /// The response frame could not be parsed.
    BadResponse(Cow<'static, str>),
    /// The handshake was rejected; the server answered with the
    /// protocol version it supports and a reason.
    HandshakeFailed { version: (i16, i16, i16), message: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServerError::BadResponse(s) => write!(f, "Unable to parse response: {}", s),
            ServerError::HandshakeFailed { version, message } => write!(
                f,
                "Handshake rejected (server speaks {}.{}.{}): {}",
                version.0, version.1, version.2, message
            ),
        }
    }
}

impl error::Error for ServerError {}

impl From<ServerError> for IgniteError {
    fn from(err: ServerError) -> Self {
        IgniteError::ServerError(err)
    }
}

/// Errors reported by the cluster through the status field of a
/// response, carrying the server's error message.
#[derive(Debug, PartialEq)]
pub enum CommandError {
    GenericFailure(String),
    InvalidOpCode(String),
    InvalidNodeState(String),
    FunctionalityDisabled(String),
    CacheDoesNotExist(String),
    CacheAlreadyExists(String),
    AuthenticationFailed(String),
    SecurityViolation(String),
    Unknown(i32, String),
}

impl CommandError {
    pub(crate) fn from_status(status: i32, message: String) -> CommandError {
        match status {
            1 => CommandError::GenericFailure(message),
            2 => CommandError::InvalidOpCode(message),
            10 => CommandError::InvalidNodeState(message),
            100 => CommandError::FunctionalityDisabled(message),
            1000 => CommandError::CacheDoesNotExist(message),
            1001 => CommandError::CacheAlreadyExists(message),
            2000 => CommandError::AuthenticationFailed(message),
            3000 => CommandError::SecurityViolation(message),
            status => CommandError::Unknown(status, message),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandError::GenericFailure(m) => write!(f, "Operation failed: {}", m),
            CommandError::InvalidOpCode(m) => write!(f, "Invalid op code: {}", m),
            CommandError::InvalidNodeState(m) => write!(f, "Invalid node state: {}", m),
            CommandError::FunctionalityDisabled(m) => write!(f, "Functionality disabled: {}", m),
            CommandError::CacheDoesNotExist(m) => write!(f, "Cache does not exist: {}", m),
            CommandError::CacheAlreadyExists(m) => write!(f, "Cache already exists: {}", m),
            CommandError::AuthenticationFailed(m) => write!(f, "Authentication failed: {}", m),
            CommandError::SecurityViolation(m) => write!(f, "Security violation: {}", m),
            CommandError::Unknown(status, m) => write!(f, "Server status {}: {}", status, m),
        }
    }
}

impl error::Error for CommandError {}

impl From<CommandError> for IgniteError {
    fn from(err: CommandError) -> Self {
        IgniteError::CommandError(err)
    }
}

/// Errors turning binary objects into rust values.
#[derive(Debug)]
pub enum ParseError {
    Utf8(FromUtf8Error),
    /// The object on the wire has a different type than the one asked for.
    TypeMismatch { expected: &'static str, type_code: u8 },
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Utf8(e) => write!(f, "{}", e),
            ParseError::TypeMismatch { expected, type_code } => {
                write!(f, "Expected {} but got binary type code {}", expected, type_code)
            }
            #[cfg(feature = "json")]
            ParseError::Json(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for ParseError {}

impl From<ParseError> for IgniteError {
    fn from(err: ParseError) -> Self {
        IgniteError::ParseError(err)
    }
}

impl From<FromUtf8Error> for IgniteError {
    fn from(err: FromUtf8Error) -> Self {
        IgniteError::ParseError(ParseError::Utf8(err))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for IgniteError {
    fn from(err: serde_json::Error) -> Self {
        IgniteError::ParseError(ParseError::Json(err))
    }
}

/// Stands for errors raised from the ignite thin client.
#[derive(Debug)]
pub enum IgniteError {
    /// `std::io` related errors.
    IOError(io::Error),
    /// Client side errors.
    ClientError(ClientError),
    /// Server side errors.
    ServerError(ServerError),
    /// Errors reported through a response status code.
    CommandError(CommandError),
    /// Errors decoding binary objects.
    ParseError(ParseError),
    /// The endpoint URL could not be understood.
    BadURL(String),
    /// Connection pool errors.
    PoolError(r2d2::Error),
    #[cfg(feature = "tls")]
    OpensslError(openssl::ssl::HandshakeError<std::net::TcpStream>),
}

impl fmt::Display for IgniteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IgniteError::IOError(e) => write!(f, "{}", e),
            IgniteError::ClientError(e) => write!(f, "{}", e),
            IgniteError::ServerError(e) => write!(f, "{}", e),
            IgniteError::CommandError(e) => write!(f, "{}", e),
            IgniteError::ParseError(e) => write!(f, "{}", e),
            IgniteError::BadURL(e) => write!(f, "{}", e),
            IgniteError::PoolError(e) => write!(f, "{}", e),
            #[cfg(feature = "tls")]
            IgniteError::OpensslError(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for IgniteError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            IgniteError::IOError(e) => Some(e),
            IgniteError::ClientError(e) => Some(e),
            IgniteError::ServerError(e) => Some(e),
            IgniteError::CommandError(e) => Some(e),
            IgniteError::ParseError(e) => Some(e),
            IgniteError::BadURL(_) => None,
            IgniteError::PoolError(e) => Some(e),
            #[cfg(feature = "tls")]
            IgniteError::OpensslError(e) => Some(e),
        }
    }
}

impl From<io::Error> for IgniteError {
    fn from(err: io::Error) -> IgniteError {
        IgniteError::IOError(err)
    }
}

impl From<url::ParseError> for IgniteError {
    fn from(err: url::ParseError) -> IgniteError {
        IgniteError::BadURL(err.to_string())
    }
}

impl From<r2d2::Error> for IgniteError {
    fn from(err: r2d2::Error) -> IgniteError {
        IgniteError::PoolError(err)
    }
}

#[cfg(feature = "tls")]
impl From<openssl::error::ErrorStack> for IgniteError {
    fn from(err: openssl::error::ErrorStack) -> IgniteError {
        IgniteError::OpensslError(err.into())
    }
}

#[cfg(feature = "tls")]
impl From<openssl::ssl::HandshakeError<std::net::TcpStream>> for IgniteError {
    fn from(err: openssl::ssl::HandshakeError<std::net::TcpStream>) -> IgniteError {
        IgniteError::OpensslError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_typed_errors() {
        assert_eq!(
            CommandError::from_status(2000, "The user name or password is incorrect".into()),
            CommandError::AuthenticationFailed("The user name or password is incorrect".into())
        );
        assert_eq!(
            CommandError::from_status(1001, "a cache with the same name already started".into()),
            CommandError::CacheAlreadyExists("a cache with the same name already started".into())
        );
        assert_eq!(
            CommandError::from_status(424242, "boom".into()),
            CommandError::Unknown(424242, "boom".into())
        );
    }

    #[test]
    fn display_carries_the_server_message() {
        let err = IgniteError::from(CommandError::from_status(2000, "bad credentials".into()));
        assert_eq!(format!("{}", err), "Authentication failed: bad credentials");
    }
}
