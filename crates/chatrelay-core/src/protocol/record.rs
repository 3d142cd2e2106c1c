use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ChatError, Result};

/// Record type tag (field name is `type` in JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    RequestUsername,
    Message,
    UserJoined,
    UserLeft,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::RequestUsername => "request_username",
            RecordKind::Message => "message",
            RecordKind::UserJoined => "user_joined",
            RecordKind::UserLeft => "user_left",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "request_username" => Some(RecordKind::RequestUsername),
            "message" => Some(RecordKind::Message),
            "user_joined" => Some(RecordKind::UserJoined),
            "user_left" => Some(RecordKind::UserLeft),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-wire record object.
///
/// Decoding is lenient about content: every field is optional (missing or
/// `null` reads as empty), unknown fields are ignored, and an unknown `type`
/// is kept as-is. It is strict about shape: only a JSON object is a record.
/// The server reads peers through this type and never trusts `type` or
/// `username` coming from a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub username: String,
    pub message: String,
}

impl<'de> Deserialize<'de> for WireRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // deserialize_map, not deserialize_struct: serde_json would accept a
        // positional array for a derived struct.
        deserializer.deserialize_map(WireRecordVisitor)
    }
}

struct WireRecordVisitor;

impl<'de> Visitor<'de> for WireRecordVisitor {
    type Value = WireRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a record object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<WireRecord, A::Error> {
        let mut rec = WireRecord::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "type" => &mut rec.kind,
                "username" => &mut rec.username,
                "message" => &mut rec.message,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            *slot = map.next_value::<Option<String>>()?.unwrap_or_default();
        }
        Ok(rec)
    }
}

/// A message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireRecord", try_from = "WireRecord")]
pub enum Record {
    /// Server -> client prompt for a display name.
    RequestUsername,
    /// Chat line attributed to `username`.
    Message { username: String, message: String },
    UserJoined { username: String },
    UserLeft { username: String },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::RequestUsername => RecordKind::RequestUsername,
            Record::Message { .. } => RecordKind::Message,
            Record::UserJoined { .. } => RecordKind::UserJoined,
            Record::UserLeft { .. } => RecordKind::UserLeft,
        }
    }

    pub fn message(username: impl Into<String>, message: impl Into<String>) -> Self {
        Record::Message {
            username: username.into(),
            message: message.into(),
        }
    }

    pub fn user_joined(username: impl Into<String>) -> Self {
        Record::UserJoined {
            username: username.into(),
        }
    }

    pub fn user_left(username: impl Into<String>) -> Self {
        Record::UserLeft {
            username: username.into(),
        }
    }

    /// Username carried by the record, empty for `RequestUsername`.
    pub fn username(&self) -> &str {
        match self {
            Record::RequestUsername => "",
            Record::Message { username, .. }
            | Record::UserJoined { username }
            | Record::UserLeft { username } => username,
        }
    }
}

impl From<Record> for WireRecord {
    fn from(r: Record) -> Self {
        let kind = r.kind().as_str().to_string();
        match r {
            Record::RequestUsername => WireRecord {
                kind,
                ..WireRecord::default()
            },
            Record::Message { username, message } => WireRecord {
                kind,
                username,
                message,
            },
            Record::UserJoined { username } | Record::UserLeft { username } => WireRecord {
                kind,
                username,
                message: String::new(),
            },
        }
    }
}

impl TryFrom<WireRecord> for Record {
    type Error = ChatError;

    fn try_from(w: WireRecord) -> Result<Self> {
        let kind = RecordKind::parse(&w.kind).ok_or_else(|| ChatError::UnknownType(w.kind.clone()))?;
        Ok(match kind {
            RecordKind::RequestUsername => Record::RequestUsername,
            RecordKind::Message => Record::Message {
                username: w.username,
                message: w.message,
            },
            RecordKind::UserJoined => Record::UserJoined { username: w.username },
            RecordKind::UserLeft => Record::UserLeft { username: w.username },
        })
    }
}
