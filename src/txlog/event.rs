//! Log event definitions
//!
//! Defines the unit of durability and its on-disk record encoding.

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{Result, TxkvError};
use super::LogReader;

/// Largest key accepted by the log, in bytes
pub const MAX_KEY_SIZE: usize = 1024;

/// Largest value accepted by the log, in bytes
pub const MAX_VALUE_SIZE: usize = 65536;

/// Operation recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Set,
    Delete,
}

impl Op {
    /// Tag written at the start of each record
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Set => "set",
            Op::Delete => "delete",
        }
    }

    /// Parse a record tag
    pub fn from_tag(tag: &[u8]) -> Option<Op> {
        match tag {
            b"set" => Some(Op::Set),
            b"delete" => Some(Op::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Key being mutated
    pub key: Vec<u8>,

    /// New value (empty for deletes)
    pub value: Vec<u8>,

    /// The operation
    pub op: Op,
}

impl Event {
    /// Build a `set` event
    pub fn set(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            op: Op::Set,
        }
    }

    /// Build a `delete` event
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Vec::new(),
            op: Op::Delete,
        }
    }

    /// Check key and value against the size limits
    pub fn validate(&self) -> Result<()> {
        if self.key.len() > MAX_KEY_SIZE {
            return Err(TxkvError::KeyTooLarge {
                size: self.key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Err(TxkvError::ValueTooLarge {
                size: self.value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        Ok(())
    }

    /// Encode as one complete record: `<op> <keyLen> <valLen> <key><value>\n`
    ///
    /// The whole record is assembled in memory so it can be written with a
    /// single call.
    pub fn encode(&self) -> Result<BytesMut> {
        self.validate()?;

        let key_len = self.key.len().to_string();
        let value_len = self.value.len().to_string();

        let mut buf = BytesMut::with_capacity(
            self.op.as_str().len()
                + key_len.len()
                + value_len.len()
                + 3
                + self.key.len()
                + self.value.len()
                + 1,
        );
        buf.put_slice(self.op.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(key_len.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(value_len.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);
        buf.put_u8(b'\n');

        Ok(buf)
    }

    /// Decode the first record in `bytes`
    ///
    /// Returns the event and the number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<(Event, usize)> {
        let mut reader = LogReader::new(bytes);
        match reader.next_event()? {
            Some(event) => Ok((event, reader.offset() as usize)),
            None => Err(TxkvError::Corruption {
                offset: 0,
                reason: "no record in input".to_string(),
            }),
        }
    }
}
