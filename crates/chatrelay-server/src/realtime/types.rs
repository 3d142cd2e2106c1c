use std::fmt;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Encoder;

use chatrelay_core::error::Result;
use chatrelay_core::{JsonRecordCodec, Record, RecordKind, WireRecord};

/// Connection identity. Allocated once per accepted transport and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Record encoded once for fan-out (serialize once, write N times).
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    kind: RecordKind,
    bytes: Bytes,
}

impl PreparedRecord {
    pub fn encode(record: &Record) -> Result<Self> {
        let mut buf = BytesMut::new();
        JsonRecordCodec::<WireRecord>::default().encode(record.clone(), &mut buf)?;
        Ok(Self {
            kind: record.kind(),
            bytes: buf.freeze(),
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
