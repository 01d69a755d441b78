use crate::error::{IgniteError, ServerError};
use crate::protocol::message::{self, Opcode, RequestHeader, Response};
use crate::stream::Stream;
use crate::value::{self, FromIgniteValue, ToIgniteValue};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io::Write;

/// One handshaken thin client session over a stream. Strictly
/// request/reply; request ids only guard against desynchronization.
pub struct ThinProtocol {
    pub stream: Stream,
    request_id: i64,
}

impl ThinProtocol {
    pub(crate) fn new(stream: Stream) -> ThinProtocol {
        ThinProtocol { stream, request_id: 0 }
    }

    /// Performs the protocol handshake, authenticating when
    /// credentials are given. Blocks until the server answers.
    pub(crate) fn handshake(&mut self, credentials: Option<(&str, &str)>) -> Result<(), IgniteError> {
        message::write_handshake(&mut self.stream, credentials)?;
        self.stream.flush()?;
        message::parse_handshake_response(&mut self.stream, credentials.is_some())
    }

    fn next_id(&mut self) -> i64 {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id
    }

    fn read_reply(&mut self, id: i64) -> Result<Response, IgniteError> {
        let response = message::parse_response(&mut self.stream)?;
        if response.id != id {
            Err(ServerError::BadResponse(Cow::Borrowed(
                "response id does not match the request",
            )))?
        }
        Ok(response)
    }

    fn write_cache_header(&mut self, op: Opcode, cache_id: i32, body_length: usize) -> Result<i64, IgniteError> {
        let id = self.next_id();
        RequestHeader {
            op_code: op as i16,
            id,
            body_length: 5 + body_length,
        }
        .write(&mut self.stream)?;
        self.stream.write_i32::<LittleEndian>(cache_id)?;
        self.stream.write_u8(0)?; // flags: plain objects, no transaction
        Ok(id)
    }

    pub fn put<K: ToIgniteValue<Stream>, V: ToIgniteValue<Stream>>(
        &mut self,
        cache_id: i32,
        key: K,
        value: V,
    ) -> Result<(), IgniteError> {
        let id = self.write_cache_header(Opcode::CachePut, cache_id, key.get_length() + value.get_length())?;
        key.write_to(&mut self.stream)?;
        value.write_to(&mut self.stream)?;
        self.stream.flush()?;
        self.read_reply(id)?;
        Ok(())
    }

    pub fn get<K: ToIgniteValue<Stream>, V: FromIgniteValue>(
        &mut self,
        cache_id: i32,
        key: K,
    ) -> Result<Option<V>, IgniteError> {
        let id = self.write_cache_header(Opcode::CacheGet, cache_id, key.get_length())?;
        key.write_to(&mut self.stream)?;
        self.stream.flush()?;
        let mut response = self.read_reply(id)?;
        match value::read_object(&mut response.payload)? {
            Some((type_code, payload)) => Ok(Some(V::from_ignite_value(type_code, payload)?)),
            None => Ok(None),
        }
    }

    pub fn contains_key<K: ToIgniteValue<Stream>>(&mut self, cache_id: i32, key: K) -> Result<bool, IgniteError> {
        let id = self.write_cache_header(Opcode::CacheContainsKey, cache_id, key.get_length())?;
        key.write_to(&mut self.stream)?;
        self.stream.flush()?;
        let mut response = self.read_reply(id)?;
        Ok(response.payload.read_u8()? != 0)
    }

    pub fn remove_key<K: ToIgniteValue<Stream>>(&mut self, cache_id: i32, key: K) -> Result<bool, IgniteError> {
        let id = self.write_cache_header(Opcode::CacheRemoveKey, cache_id, key.get_length())?;
        key.write_to(&mut self.stream)?;
        self.stream.flush()?;
        let mut response = self.read_reply(id)?;
        Ok(response.payload.read_u8()? != 0)
    }

    pub fn clear(&mut self, cache_id: i32) -> Result<(), IgniteError> {
        let id = self.write_cache_header(Opcode::CacheClear, cache_id, 0)?;
        self.stream.flush()?;
        self.read_reply(id)?;
        Ok(())
    }

    pub fn get_size(&mut self, cache_id: i32) -> Result<i64, IgniteError> {
        let id = self.write_cache_header(Opcode::CacheGetSize, cache_id, 4)?;
        // zero peek modes means all entries
        self.stream.write_i32::<LittleEndian>(0)?;
        self.stream.flush()?;
        let mut response = self.read_reply(id)?;
        Ok(response.payload.read_i64::<LittleEndian>()?)
    }

    pub fn get_or_create_cache(&mut self, name: &str) -> Result<(), IgniteError> {
        self.cache_by_name(Opcode::CacheGetOrCreateWithName, name)
    }

    pub fn create_cache(&mut self, name: &str) -> Result<(), IgniteError> {
        self.cache_by_name(Opcode::CacheCreateWithName, name)
    }

    fn cache_by_name(&mut self, op: Opcode, name: &str) -> Result<(), IgniteError> {
        let id = self.next_id();
        RequestHeader {
            op_code: op as i16,
            id,
            body_length: ToIgniteValue::<Stream>::get_length(&name),
        }
        .write(&mut self.stream)?;
        ToIgniteValue::<Stream>::write_to(&name, &mut self.stream)?;
        self.stream.flush()?;
        self.read_reply(id)?;
        Ok(())
    }

    pub fn destroy_cache(&mut self, cache_id: i32) -> Result<(), IgniteError> {
        let id = self.next_id();
        RequestHeader {
            op_code: Opcode::CacheDestroy as i16,
            id,
            body_length: 4,
        }
        .write(&mut self.stream)?;
        self.stream.write_i32::<LittleEndian>(cache_id)?;
        self.stream.flush()?;
        self.read_reply(id)?;
        Ok(())
    }

    pub fn cache_names(&mut self) -> Result<Vec<String>, IgniteError> {
        let id = self.next_id();
        RequestHeader {
            op_code: Opcode::CacheGetNames as i16,
            id,
            body_length: 0,
        }
        .write(&mut self.stream)?;
        self.stream.flush()?;
        let mut response = self.read_reply(id)?;
        let count = response.payload.read_i32::<LittleEndian>()?;
        let mut names = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            match value::read_object(&mut response.payload)? {
                Some((type_code, payload)) => names.push(String::from_ignite_value(type_code, payload)?),
                None => Err(ServerError::BadResponse(Cow::Borrowed("null cache name")))?,
            }
        }
        Ok(names)
    }
}
