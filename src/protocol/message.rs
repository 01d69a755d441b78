use crate::error::{CommandError, IgniteError, ServerError};
use crate::value::{self, type_codes, ToIgniteValue};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io::{self, Cursor};

/// Protocol version spoken by this client. 1.2.0 is the first version
/// with username/password authentication in the handshake.
pub const PROTOCOL_VERSION: (i16, i16, i16) = (1, 2, 0);

const OP_HANDSHAKE: u8 = 1;
const CLIENT_CODE: u8 = 2;
const SUCCESS_STATUS: i32 = 0;

#[allow(dead_code)]
pub enum Opcode {
    CacheGet = 1000,
    CachePut = 1001,
    CacheContainsKey = 1011,
    CacheClear = 1013,
    CacheRemoveKey = 1016,
    CacheGetSize = 1020,
    CacheGetNames = 1050,
    CacheCreateWithName = 1051,
    CacheGetOrCreateWithName = 1052,
    CacheDestroy = 1056,
}

#[derive(Debug)]
pub struct RequestHeader {
    pub op_code: i16,
    pub id: i64,
    pub body_length: usize,
}

impl RequestHeader {
    pub fn write<W: io::Write>(self, writer: &mut W) -> Result<(), io::Error> {
        // the length prefix counts everything after itself
        writer.write_i32::<LittleEndian>((2 + 8 + self.body_length) as i32)?;
        writer.write_i16::<LittleEndian>(self.op_code)?;
        writer.write_i64::<LittleEndian>(self.id)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Response {
    pub id: i64,
    pub payload: Cursor<Vec<u8>>,
}

pub fn parse_response<R: io::Read>(reader: &mut R) -> Result<Response, IgniteError> {
    let length = reader.read_i32::<LittleEndian>()?;
    if length < 12 {
        Err(ServerError::BadResponse(Cow::Borrowed("response frame is too short")))?
    }
    let id = reader.read_i64::<LittleEndian>()?;
    let status = reader.read_i32::<LittleEndian>()?;
    let mut payload = vec![0; (length - 12) as usize];
    reader.read_exact(payload.as_mut_slice())?;
    let mut payload = Cursor::new(payload);
    if status != SUCCESS_STATUS {
        Err(CommandError::from_status(status, read_error_message(&mut payload)?))?
    }
    Ok(Response { id, payload })
}

pub fn write_handshake<W: io::Write>(writer: &mut W, credentials: Option<(&str, &str)>) -> Result<(), io::Error> {
    // op + three version shorts + client code
    let mut length = 1 + 6 + 1;
    if let Some((username, password)) = credentials {
        length += ToIgniteValue::<W>::get_length(&username) + ToIgniteValue::<W>::get_length(&password);
    }
    writer.write_i32::<LittleEndian>(length as i32)?;
    writer.write_u8(OP_HANDSHAKE)?;
    writer.write_i16::<LittleEndian>(PROTOCOL_VERSION.0)?;
    writer.write_i16::<LittleEndian>(PROTOCOL_VERSION.1)?;
    writer.write_i16::<LittleEndian>(PROTOCOL_VERSION.2)?;
    writer.write_u8(CLIENT_CODE)?;
    if let Some((username, password)) = credentials {
        ToIgniteValue::<W>::write_to(&username, writer)?;
        ToIgniteValue::<W>::write_to(&password, writer)?;
    }
    Ok(())
}

/// Parses the handshake reply. A rejected handshake while credentials
/// were supplied is reported as an authentication failure; without
/// credentials it is a protocol version mismatch.
pub fn parse_handshake_response<R: io::Read>(reader: &mut R, authenticating: bool) -> Result<(), IgniteError> {
    let length = reader.read_i32::<LittleEndian>()?;
    if length < 1 {
        Err(ServerError::BadResponse(Cow::Borrowed("empty handshake response")))?
    }
    let mut payload = vec![0; length as usize];
    reader.read_exact(payload.as_mut_slice())?;
    let mut payload = Cursor::new(payload);
    if payload.read_u8()? == 1 {
        return Ok(());
    }
    let major = payload.read_i16::<LittleEndian>()?;
    let minor = payload.read_i16::<LittleEndian>()?;
    let patch = payload.read_i16::<LittleEndian>()?;
    let message = read_error_message(&mut payload)?;
    if authenticating {
        return Err(CommandError::AuthenticationFailed(message).into());
    }
    Err(ServerError::HandshakeFailed {
        version: (major, minor, patch),
        message,
    })?
}

fn read_error_message<R: io::Read>(reader: &mut R) -> Result<String, IgniteError> {
    match value::read_object(reader)? {
        Some((type_codes::STRING, bytes)) => Ok(String::from_utf8(bytes)?),
        _ => Ok(String::from("the server did not provide an error message")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_request_layout() {
        let mut buffer = vec![];
        write_handshake(&mut buffer, Some(("ignite", "ignite"))).unwrap();
        let expected_length: usize = 8 + 2 * (5 + 6);
        assert_eq!(&buffer[0..4], (expected_length as i32).to_le_bytes());
        // op, version 1.2.0, client code
        assert_eq!(&buffer[4..12], [1, 1, 0, 2, 0, 0, 0, 2]);
        // username as a binary string object
        assert_eq!(&buffer[12..23], [9, 6, 0, 0, 0, b'i', b'g', b'n', b'i', b't', b'e']);
        assert_eq!(buffer.len(), 4 + expected_length);
    }

    #[test]
    fn anonymous_handshake_has_no_credentials() {
        let mut buffer = vec![];
        write_handshake(&mut buffer, None).unwrap();
        assert_eq!(buffer, [8, 0, 0, 0, 1, 1, 0, 2, 0, 0, 0, 2]);
    }

    #[test]
    fn rejected_handshake_with_credentials_is_an_auth_failure() {
        let mut frame = vec![];
        frame.write_u8(0).unwrap();
        frame.write_i16::<LittleEndian>(1).unwrap();
        frame.write_i16::<LittleEndian>(2).unwrap();
        frame.write_i16::<LittleEndian>(0).unwrap();
        ToIgniteValue::<Vec<u8>>::write_to(&"bad credentials", &mut frame).unwrap();
        let mut buffer = vec![];
        buffer.write_i32::<LittleEndian>(frame.len() as i32).unwrap();
        buffer.extend_from_slice(&frame);

        match parse_handshake_response(&mut Cursor::new(&buffer), true) {
            Err(IgniteError::CommandError(CommandError::AuthenticationFailed(m))) => {
                assert_eq!(m, "bad credentials")
            }
            other => panic!("expected an authentication failure, got {:?}", other),
        }
        match parse_handshake_response(&mut Cursor::new(&buffer), false) {
            Err(IgniteError::ServerError(ServerError::HandshakeFailed { version, message })) => {
                assert_eq!(version, (1, 2, 0));
                assert_eq!(message, "bad credentials");
            }
            other => panic!("expected a handshake failure, got {:?}", other),
        }
    }

    #[test]
    fn successful_response_exposes_the_payload() {
        let mut buffer = vec![];
        buffer.write_i32::<LittleEndian>(12 + 1).unwrap();
        buffer.write_i64::<LittleEndian>(7).unwrap();
        buffer.write_i32::<LittleEndian>(0).unwrap();
        buffer.write_u8(1).unwrap();

        let mut response = parse_response(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.payload.read_u8().unwrap(), 1);
    }

    #[test]
    fn failed_response_becomes_a_command_error() {
        let mut message = vec![];
        ToIgniteValue::<Vec<u8>>::write_to(&"cache is gone", &mut message).unwrap();
        let mut buffer = vec![];
        buffer.write_i32::<LittleEndian>((12 + message.len()) as i32).unwrap();
        buffer.write_i64::<LittleEndian>(8).unwrap();
        buffer.write_i32::<LittleEndian>(1000).unwrap();
        buffer.extend_from_slice(&message);

        match parse_response(&mut Cursor::new(&buffer)) {
            Err(IgniteError::CommandError(CommandError::CacheDoesNotExist(m))) => {
                assert_eq!(m, "cache is gone")
            }
            other => panic!("expected a cache error, got {:?}", other),
        }
    }
}
