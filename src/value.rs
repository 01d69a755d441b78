use crate::error::{IgniteError, ParseError, ServerError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io;
use std::io::{Cursor, Read, Write};

/// Binary object type codes of the thin client protocol.
pub(crate) mod type_codes {
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const BOOL: u8 = 8;
    pub const STRING: u8 = 9;
    pub const BYTE_ARRAY: u8 = 12;
    pub const NULL: u8 = 101;
}

/// determine how the value is serialized to an ignite binary object
pub trait ToIgniteValue<W: Write> {
    fn type_code(&self) -> u8;
    /// Total number of bytes `write_to` puts on the wire, type code
    /// and length prefix included.
    fn get_length(&self) -> usize;
    fn write_to(&self, stream: &mut W) -> io::Result<()>;
}

macro_rules! impl_to_ignite_value_for_number {
    ($ty:ty, $code:expr, $size:expr, $write:ident) => {
        impl<W: Write> ToIgniteValue<W> for $ty {
            fn type_code(&self) -> u8 {
                $code
            }

            fn get_length(&self) -> usize {
                1 + $size
            }

            fn write_to(&self, stream: &mut W) -> io::Result<()> {
                stream.write_u8($code)?;
                stream.$write::<LittleEndian>(*self)
            }
        }
    };
}

impl_to_ignite_value_for_number!(i16, type_codes::SHORT, 2, write_i16);
impl_to_ignite_value_for_number!(i32, type_codes::INT, 4, write_i32);
impl_to_ignite_value_for_number!(i64, type_codes::LONG, 8, write_i64);
impl_to_ignite_value_for_number!(f32, type_codes::FLOAT, 4, write_f32);
impl_to_ignite_value_for_number!(f64, type_codes::DOUBLE, 8, write_f64);

impl<W: Write> ToIgniteValue<W> for i8 {
    fn type_code(&self) -> u8 {
        type_codes::BYTE
    }

    fn get_length(&self) -> usize {
        2
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        stream.write_u8(type_codes::BYTE)?;
        stream.write_i8(*self)
    }
}

impl<W: Write> ToIgniteValue<W> for bool {
    fn type_code(&self) -> u8 {
        type_codes::BOOL
    }

    fn get_length(&self) -> usize {
        2
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        stream.write_u8(type_codes::BOOL)?;
        stream.write_u8(*self as u8)
    }
}

impl<'a, W: Write> ToIgniteValue<W> for &'a str {
    fn type_code(&self) -> u8 {
        type_codes::STRING
    }

    fn get_length(&self) -> usize {
        1 + 4 + self.as_bytes().len()
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        stream.write_u8(type_codes::STRING)?;
        stream.write_i32::<LittleEndian>(self.as_bytes().len() as i32)?;
        stream.write_all(self.as_bytes())
    }
}

impl<W: Write> ToIgniteValue<W> for String {
    fn type_code(&self) -> u8 {
        ToIgniteValue::<W>::type_code(&self.as_str())
    }

    fn get_length(&self) -> usize {
        ToIgniteValue::<W>::get_length(&self.as_str())
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        ToIgniteValue::<W>::write_to(&self.as_str(), stream)
    }
}

impl<'a, W: Write> ToIgniteValue<W> for &'a String {
    fn type_code(&self) -> u8 {
        ToIgniteValue::<W>::type_code(*self)
    }

    fn get_length(&self) -> usize {
        ToIgniteValue::<W>::get_length(*self)
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        ToIgniteValue::<W>::write_to(*self, stream)
    }
}

impl<'a, W: Write> ToIgniteValue<W> for &'a [u8] {
    fn type_code(&self) -> u8 {
        type_codes::BYTE_ARRAY
    }

    fn get_length(&self) -> usize {
        1 + 4 + self.len()
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        stream.write_u8(type_codes::BYTE_ARRAY)?;
        stream.write_i32::<LittleEndian>(self.len() as i32)?;
        stream.write_all(self)
    }
}

impl<W: Write> ToIgniteValue<W> for Vec<u8> {
    fn type_code(&self) -> u8 {
        ToIgniteValue::<W>::type_code(&self.as_slice())
    }

    fn get_length(&self) -> usize {
        ToIgniteValue::<W>::get_length(&self.as_slice())
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        ToIgniteValue::<W>::write_to(&self.as_slice(), stream)
    }
}

impl<W: Write, T: ToIgniteValue<W>> ToIgniteValue<W> for Option<T> {
    fn type_code(&self) -> u8 {
        match self {
            Some(v) => v.type_code(),
            None => type_codes::NULL,
        }
    }

    fn get_length(&self) -> usize {
        match self {
            Some(v) => v.get_length(),
            None => 1,
        }
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        match self {
            Some(v) => v.write_to(stream),
            None => stream.write_u8(type_codes::NULL),
        }
    }
}

#[cfg(feature = "json")]
impl<W: Write> ToIgniteValue<W> for serde_json::Value {
    fn type_code(&self) -> u8 {
        type_codes::STRING
    }

    fn get_length(&self) -> usize {
        1 + 4 + self.to_string().len()
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        ToIgniteValue::<W>::write_to(&self.to_string(), stream)
    }
}

/// Wrapper that stores any serde-serializable value as a JSON string.
#[cfg(feature = "json")]
#[derive(Debug, PartialEq)]
pub struct Json<T>(pub T);

#[cfg(feature = "json")]
impl<W: Write, T: serde::Serialize> ToIgniteValue<W> for Json<T> {
    fn type_code(&self) -> u8 {
        type_codes::STRING
    }

    fn get_length(&self) -> usize {
        1 + 4 + serde_json::to_vec(&self.0).map(|b| b.len()).unwrap_or(0)
    }

    fn write_to(&self, stream: &mut W) -> io::Result<()> {
        let bytes = serde_json::to_vec(&self.0).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        stream.write_u8(type_codes::STRING)?;
        stream.write_i32::<LittleEndian>(bytes.len() as i32)?;
        stream.write_all(&bytes)
    }
}

type IgniteValue<T> = Result<T, IgniteError>;

/// determine how a binary object payload is deserialized into a rust value
pub trait FromIgniteValue: Sized {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self>;
}

macro_rules! impl_from_ignite_value_for_number {
    ($ty:ty, $code:expr, $name:expr, $read:ident) => {
        impl FromIgniteValue for $ty {
            fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
                if type_code != $code {
                    Err(ParseError::TypeMismatch {
                        expected: $name,
                        type_code,
                    })?
                }
                Ok(Cursor::new(payload).$read::<LittleEndian>()?)
            }
        }
    };
}

impl_from_ignite_value_for_number!(i16, type_codes::SHORT, "short", read_i16);
impl_from_ignite_value_for_number!(i32, type_codes::INT, "int", read_i32);
impl_from_ignite_value_for_number!(i64, type_codes::LONG, "long", read_i64);
impl_from_ignite_value_for_number!(f32, type_codes::FLOAT, "float", read_f32);
impl_from_ignite_value_for_number!(f64, type_codes::DOUBLE, "double", read_f64);

impl FromIgniteValue for i8 {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::BYTE {
            Err(ParseError::TypeMismatch {
                expected: "byte",
                type_code,
            })?
        }
        Ok(Cursor::new(payload).read_i8()?)
    }
}

impl FromIgniteValue for bool {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::BOOL {
            Err(ParseError::TypeMismatch {
                expected: "bool",
                type_code,
            })?
        }
        Ok(Cursor::new(payload).read_u8()? != 0)
    }
}

impl FromIgniteValue for String {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::STRING {
            Err(ParseError::TypeMismatch {
                expected: "string",
                type_code,
            })?
        }
        Ok(String::from_utf8(payload)?)
    }
}

impl FromIgniteValue for Vec<u8> {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::BYTE_ARRAY {
            Err(ParseError::TypeMismatch {
                expected: "byte array",
                type_code,
            })?
        }
        Ok(payload)
    }
}

#[cfg(feature = "json")]
impl FromIgniteValue for serde_json::Value {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::STRING {
            Err(ParseError::TypeMismatch {
                expected: "string",
                type_code,
            })?
        }
        Ok(serde_json::from_slice(&payload)?)
    }
}

#[cfg(feature = "json")]
impl<T: serde::de::DeserializeOwned> FromIgniteValue for Json<T> {
    fn from_ignite_value(type_code: u8, payload: Vec<u8>) -> IgniteValue<Self> {
        if type_code != type_codes::STRING {
            Err(ParseError::TypeMismatch {
                expected: "string",
                type_code,
            })?
        }
        Ok(Json(serde_json::from_slice(&payload)?))
    }
}

/// Reads one binary object off the wire. Returns the type code and the
/// payload bytes with the length prefix stripped, or `None` for null.
pub(crate) fn read_object<R: Read>(reader: &mut R) -> Result<Option<(u8, Vec<u8>)>, IgniteError> {
    let type_code = reader.read_u8()?;
    let size = match type_code {
        type_codes::NULL => return Ok(None),
        type_codes::BYTE | type_codes::BOOL => 1,
        type_codes::SHORT => 2,
        type_codes::INT | type_codes::FLOAT => 4,
        type_codes::LONG | type_codes::DOUBLE => 8,
        type_codes::STRING | type_codes::BYTE_ARRAY => {
            let size = reader.read_i32::<LittleEndian>()?;
            if size < 0 {
                Err(ServerError::BadResponse(Cow::Borrowed("negative object length")))?
            }
            size as usize
        }
        code => Err(ServerError::BadResponse(Cow::Owned(format!(
            "unsupported binary type code {}",
            code
        ))))?,
    };
    let mut payload = vec![0; size];
    reader.read_exact(payload.as_mut_slice())?;
    Ok(Some((type_code, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IgniteError;

    fn encode<V: ToIgniteValue<Vec<u8>>>(value: V) -> Vec<u8> {
        let mut buffer = vec![];
        let length = value.get_length();
        value.write_to(&mut buffer).unwrap();
        assert_eq!(buffer.len(), length);
        buffer
    }

    #[test]
    fn int_layout() {
        assert_eq!(encode(42i32), vec![3, 42, 0, 0, 0]);
        assert_eq!(encode(-1i64), vec![4, 255, 255, 255, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn string_layout() {
        assert_eq!(encode("hi"), vec![9, 2, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn null_layout() {
        let value: Option<i32> = None;
        assert_eq!(encode(value), vec![101]);
        assert_eq!(encode(Some(true)), vec![8, 1]);
    }

    #[test]
    fn read_back_a_string() {
        let mut cursor = Cursor::new(encode(String::from("Hello Ignite Thin Client with auth!")));
        let (code, payload) = read_object(&mut cursor).unwrap().unwrap();
        let value = String::from_ignite_value(code, payload).unwrap();
        assert_eq!(value, "Hello Ignite Thin Client with auth!");
    }

    #[test]
    fn read_back_a_null() {
        let mut cursor = Cursor::new(vec![101]);
        assert!(read_object(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let mut cursor = Cursor::new(encode(42i32));
        let (code, payload) = read_object(&mut cursor).unwrap().unwrap();
        match String::from_ignite_value(code, payload) {
            Err(IgniteError::ParseError(_)) => {}
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_values_travel_as_strings() {
        let value = serde_json::json!({"answer": 42});
        let mut cursor = Cursor::new(encode(value.clone()));
        let (code, payload) = read_object(&mut cursor).unwrap().unwrap();
        assert_eq!(code, type_codes::STRING);
        let back: serde_json::Value = FromIgniteValue::from_ignite_value(code, payload).unwrap();
        assert_eq!(back, value);
    }
}
