//! Log Reader
//!
//! Decodes records from a transaction log stream. The store never reads its
//! own log; this is used by tooling and tests.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, TxkvError};
use super::{Event, Op, MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// Longest header field: `delete` or a 20 digit length, plus the space
const MAX_FIELD_LEN: u64 = 21;

/// Reads records sequentially from a log stream
pub struct LogReader<R> {
    inner: R,
    offset: u64,
    failed: bool,
}

impl LogReader<BufReader<File>> {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TxkvError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LogReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset just past the last record decoded
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of input between records.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let start = self.offset;
        let mut consumed = 0u64;

        let tag = match self.read_field(start, &mut consumed)? {
            Some(tag) => tag,
            None => return Ok(None),
        };
        let op = Op::from_tag(&tag).ok_or_else(|| TxkvError::Corruption {
            offset: start,
            reason: format!("unknown op tag {:?}", String::from_utf8_lossy(&tag)),
        })?;

        let key_len = self.read_length(start, &mut consumed, "key", MAX_KEY_SIZE)?;
        let value_len = self.read_length(start, &mut consumed, "value", MAX_VALUE_SIZE)?;

        let mut key = vec![0u8; key_len];
        self.read_block(start, &mut key)?;
        let mut value = vec![0u8; value_len];
        self.read_block(start, &mut value)?;

        let mut terminator = [0u8; 1];
        self.read_block(start, &mut terminator)?;
        if terminator[0] != b'\n' {
            return Err(TxkvError::Corruption {
                offset: start,
                reason: format!("expected newline after record, found 0x{:02x}", terminator[0]),
            });
        }

        consumed += (key_len + value_len + 1) as u64;
        self.offset = start + consumed;

        Ok(Some(Event { key, value, op }))
    }

    /// Read one space-terminated header field, without the space.
    ///
    /// `None` means the input ended before the field started.
    fn read_field(&mut self, start: u64, consumed: &mut u64) -> Result<Option<Vec<u8>>> {
        let mut field = Vec::new();
        let n = (&mut self.inner)
            .take(MAX_FIELD_LEN)
            .read_until(b' ', &mut field)?;

        if n == 0 {
            return Ok(None);
        }
        *consumed += n as u64;

        if field.last() != Some(&b' ') {
            let reason = if (n as u64) < MAX_FIELD_LEN {
                "truncated record header".to_string()
            } else {
                "record header field too long".to_string()
            };
            return Err(TxkvError::Corruption { offset: start, reason });
        }

        field.pop();
        Ok(Some(field))
    }

    fn read_length(
        &mut self,
        start: u64,
        consumed: &mut u64,
        what: &str,
        max: usize,
    ) -> Result<usize> {
        let field = self
            .read_field(start, consumed)?
            .ok_or_else(|| TxkvError::Corruption {
                offset: start,
                reason: format!("truncated record: missing {} length", what),
            })?;

        if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
            return Err(TxkvError::Corruption {
                offset: start,
                reason: format!("invalid {} length {:?}", what, String::from_utf8_lossy(&field)),
            });
        }

        // Digits only, so the string is valid UTF-8 and parses unless it overflows
        let len: usize = std::str::from_utf8(&field)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| TxkvError::Corruption {
                offset: start,
                reason: format!("{} length out of range", what),
            })?;

        if len > max {
            return Err(TxkvError::Corruption {
                offset: start,
                reason: format!("{} length {} exceeds maximum of {}", what, len, max),
            });
        }
        Ok(len)
    }

    fn read_block(&mut self, start: u64, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => TxkvError::Corruption {
                offset: start,
                reason: "truncated record body".to_string(),
            },
            _ => TxkvError::Io(e),
        })
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let mut reader = LogReader::new(&b""[..]);
        assert!(reader.next_event().unwrap().is_none());
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_reads_in_order() {
        let input = b"set 1 1 a1\nset 1 1 b2\ndelete 1 0 a\n";
        let events: Vec<Event> = LogReader::new(&input[..])
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            events,
            vec![Event::set("a", "1"), Event::set("b", "2"), Event::delete("a")]
        );
    }

    #[test]
    fn test_truncated_tail_reports_offset() {
        let input = b"set 1 1 a1\nset 3 5 bc";
        let mut reader = LogReader::new(&input[..]);

        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(TxkvError::Corruption { offset, .. })) => assert_eq!(offset, 11),
            other => panic!("expected corruption, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_unknown_tag() {
        let err = LogReader::new(&b"put 1 1 a1\n"[..]).next_event().unwrap_err();
        assert!(matches!(err, TxkvError::Corruption { offset: 0, .. }));
    }

    #[test]
    fn test_rejects_signed_length() {
        let err = LogReader::new(&b"set +1 1 a1\n"[..]).next_event().unwrap_err();
        assert!(matches!(err, TxkvError::Corruption { .. }));
    }

    #[test]
    fn test_rejects_oversized_length() {
        let input = format!("set {} 0 ", MAX_KEY_SIZE + 1);
        let err = LogReader::new(input.as_bytes()).next_event().unwrap_err();
        assert!(matches!(err, TxkvError::Corruption { .. }));
    }

    #[test]
    fn test_missing_newline() {
        let err = LogReader::new(&b"set 1 1 a1Xset"[..]).next_event().unwrap_err();
        assert!(matches!(err, TxkvError::Corruption { .. }));
    }
}
