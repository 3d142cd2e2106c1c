//! Record codec for stream transports.
//!
//! Each record is one self-delimited JSON value. There is no length prefix:
//! values may be concatenated or separated by whitespace, and the decoder
//! waits for more bytes while the value is still incomplete. The encoder
//! terminates every record with `\n`.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ChatError, Result};

pub struct JsonRecordCodec<T> {
    max_record_bytes: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonRecordCodec<T> {
    pub fn new(max_record_bytes: usize) -> Self {
        Self {
            max_record_bytes,
            _item: PhantomData,
        }
    }

    pub fn max_record_bytes(&self) -> usize {
        self.max_record_bytes
    }
}

impl<T> Default for JsonRecordCodec<T> {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

impl<T> Clone for JsonRecordCodec<T> {
    fn clone(&self) -> Self {
        Self::new(self.max_record_bytes)
    }
}

impl<T: DeserializeOwned> Decoder for JsonRecordCodec<T> {
    type Item = T;
    type Error = ChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        let ws = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
        src.advance(ws);
        if src.is_empty() {
            return Ok(None);
        }

        let (next, used) = {
            let mut stream = serde_json::Deserializer::from_slice(&src[..]).into_iter::<T>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(item)) => {
                if used > self.max_record_bytes {
                    return Err(ChatError::RecordTooLarge {
                        len: used,
                        max: self.max_record_bytes,
                    });
                }
                src.advance(used);
                Ok(Some(item))
            }
            Some(Err(e)) if e.is_eof() => {
                if src.len() > self.max_record_bytes {
                    return Err(ChatError::RecordTooLarge {
                        len: src.len(),
                        max: self.max_record_bytes,
                    });
                }
                Ok(None)
            }
            Some(Err(e)) => Err(ChatError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<T>> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => Err(ChatError::Decode(format!(
                "stream ended inside a record ({} bytes pending)",
                src.len()
            ))),
        }
    }
}

impl<T, I: Serialize> Encoder<I> for JsonRecordCodec<T> {
    type Error = ChatError;

    fn encode(&mut self, item: I, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(&item).map_err(|e| ChatError::Encode(e.to_string()))?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.put_u8(b'\n');
        Ok(())
    }
}
