//! Tests for the Transaction Log
//!
//! These tests verify:
//! - Record framing on disk
//! - Size validation with no partial writes
//! - Reading back records containing spaces and newlines
//! - Sync policies
//! - Lifecycle (close, use after close)
//! - Concurrent appends

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use txkv::config::SyncPolicy;
use txkv::txlog::{Event, FileLog, Log, LogReader, Op, MAX_KEY_SIZE, MAX_VALUE_SIZE};
use txkv::TxkvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.log");
    (temp_dir, log_path)
}

fn read_all(path: &PathBuf) -> Vec<Event> {
    LogReader::open(path)
        .unwrap()
        .collect::<txkv::Result<Vec<_>>>()
        .unwrap()
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_append_writes_framed_records() {
    let (_temp, log_path) = setup_temp_log();

    let log = FileLog::open(&log_path).unwrap();
    log.append(&Event::set("user1", "Alice")).unwrap();
    log.append(&Event::delete("user2")).unwrap();
    log.close().unwrap();

    let content = fs::read(&log_path).unwrap();
    assert_eq!(content, b"set 5 5 user1Alice\ndelete 5 0 user2\n");
}

#[test]
fn test_open_creates_file() {
    let (_temp, log_path) = setup_temp_log();
    assert!(!log_path.exists());

    let log = FileLog::open(&log_path).unwrap();

    assert!(log_path.exists());
    assert_eq!(log.path(), log_path.as_path());
    assert_eq!(fs::metadata(&log_path).unwrap().len(), 0);
}

#[test]
fn test_reopen_appends_without_truncating() {
    let (_temp, log_path) = setup_temp_log();

    {
        let log = FileLog::open(&log_path).unwrap();
        log.append(&Event::set("a", "1")).unwrap();
        log.close().unwrap();
    }
    {
        let log = FileLog::open(&log_path).unwrap();
        log.append(&Event::set("b", "2")).unwrap();
        log.close().unwrap();
    }

    assert_eq!(
        read_all(&log_path),
        vec![Event::set("a", "1"), Event::set("b", "2")]
    );
}

#[test]
fn test_open_in_missing_directory_fails() {
    let (temp, _) = setup_temp_log();
    let bad_path = temp.path().join("no-such-dir").join("kv.log");

    let err = FileLog::open(&bad_path).unwrap_err();

    assert!(matches!(err, TxkvError::Open { ref path, .. } if path == &bad_path));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_key_too_large_writes_nothing() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    let err = log
        .append(&Event::set(vec![b'a'; MAX_KEY_SIZE + 1], "x"))
        .unwrap_err();

    assert!(matches!(err, TxkvError::KeyTooLarge { .. }));
    assert!(err.is_validation());
    assert_eq!(fs::metadata(&log_path).unwrap().len(), 0);
    assert_eq!(log.appended_count(), 0);
}

#[test]
fn test_value_too_large_writes_nothing() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    let err = log
        .append(&Event::set("key", vec![b'b'; MAX_VALUE_SIZE + 1]))
        .unwrap_err();

    assert!(matches!(err, TxkvError::ValueTooLarge { .. }));
    assert_eq!(fs::metadata(&log_path).unwrap().len(), 0);
}

#[test]
fn test_rejected_append_does_not_disturb_neighbours() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    log.append(&Event::set("before", "1")).unwrap();
    assert!(log
        .append(&Event::set(vec![b'k'; MAX_KEY_SIZE + 1], "x"))
        .is_err());
    log.append(&Event::set("after", "2")).unwrap();
    log.sync().unwrap();

    assert_eq!(
        read_all(&log_path),
        vec![Event::set("before", "1"), Event::set("after", "2")]
    );
}

#[test]
fn test_limits_are_inclusive() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    let event = Event::set(vec![b'k'; MAX_KEY_SIZE], vec![b'v'; MAX_VALUE_SIZE]);
    log.append(&event).unwrap();
    log.sync().unwrap();

    assert_eq!(read_all(&log_path), vec![event]);
}

// =============================================================================
// Read-Back Tests
// =============================================================================

#[test]
fn test_read_back_bytes_with_spaces_and_newlines() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    let events = vec![
        Event::set("key with spaces", "value\nwith\nnewlines"),
        Event::set("\n", " "),
        Event::set("set 1 1 x", "\ndelete 1 0 y\n"),
        Event::set("empty", ""),
        Event::delete("key with spaces"),
    ];
    for event in &events {
        log.append(event).unwrap();
    }
    log.close().unwrap();

    assert_eq!(read_all(&log_path), events);
}

#[test]
fn test_read_back_binary_values() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    let value: Vec<u8> = (0u8..=255).collect();
    log.append(&Event::set(&b"\x00\xff"[..], value.clone())).unwrap();
    log.close().unwrap();

    let events = read_all(&log_path);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, b"\x00\xff");
    assert_eq!(events[0].value, value);
    assert_eq!(events[0].op, Op::Set);
}

// =============================================================================
// Sync Policy Tests
// =============================================================================

#[test]
fn test_manual_sync_leaves_pending() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    log.append(&Event::set("k1", "v1")).unwrap();
    log.append(&Event::set("k2", "v2")).unwrap();
    assert_eq!(log.unsynced_count(), 2);

    log.sync().unwrap();
    assert_eq!(log.unsynced_count(), 0);
}

#[test]
fn test_sync_every_write() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open_with(&log_path, SyncPolicy::EveryWrite).unwrap();

    log.append(&Event::set("k1", "v1")).unwrap();
    assert_eq!(log.unsynced_count(), 0);

    log.append(&Event::set("k2", "v2")).unwrap();
    assert_eq!(log.unsynced_count(), 0);
    assert_eq!(log.appended_count(), 2);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open_with(&log_path, SyncPolicy::EveryNEntries { count: 3 }).unwrap();

    log.append(&Event::set("k1", "v")).unwrap();
    log.append(&Event::set("k2", "v")).unwrap();
    assert_eq!(log.unsynced_count(), 2);

    // 3rd entry triggers sync
    log.append(&Event::set("k3", "v")).unwrap();
    assert_eq!(log.unsynced_count(), 0);

    log.append(&Event::set("k4", "v")).unwrap();
    assert_eq!(log.unsynced_count(), 1);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_append_after_close_fails() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();
    log.close().unwrap();
    assert!(log.is_closed());

    match log.append(&Event::set("k", "v")) {
        Err(TxkvError::AppendFailed(e)) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
        other => panic!("expected AppendFailed, got {:?}", other),
    }
    assert_eq!(fs::metadata(&log_path).unwrap().len(), 0);
}

#[test]
fn test_sync_after_close_fails() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();
    log.close().unwrap();

    assert!(matches!(log.sync(), Err(TxkvError::SyncFailed(_))));
}

#[test]
fn test_double_close_fails() {
    let (_temp, log_path) = setup_temp_log();
    let log = FileLog::open(&log_path).unwrap();

    log.close().unwrap();
    assert!(matches!(log.close(), Err(TxkvError::CloseFailed(_))));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_appends_keep_records_whole() {
    let (_temp, log_path) = setup_temp_log();
    let log = Arc::new(FileLog::open(&log_path).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-k{}", t, i);
                    let value = format!("line one\nline two {}", i);
                    log.append(&Event::set(key, value)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    log.close().unwrap();

    let events = read_all(&log_path);
    assert_eq!(events.len(), 400);
    assert_eq!(log.appended_count(), 400);

    // Per-thread order is preserved
    for t in 0..8 {
        let prefix = format!("t{}-", t);
        let keys: Vec<String> = events
            .iter()
            .filter(|e| e.key.starts_with(prefix.as_bytes()))
            .map(|e| String::from_utf8(e.key.clone()).unwrap())
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("t{}-k{}", t, i)).collect();
        assert_eq!(keys, expected);
    }
}

#[test]
fn test_concurrent_appends_keep_sync_count_bounded() {
    let (_temp, log_path) = setup_temp_log();
    let log = Arc::new(
        FileLog::open_with(&log_path, SyncPolicy::EveryNEntries { count: 4 }).unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..50 {
                    log.append(&Event::set(format!("t{}-k{}", t, i), "v")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Overlapping syncs must not drive the counter below zero (it would wrap)
    assert!(log.unsynced_count() < 4);
    assert_eq!(log.appended_count(), 400);

    log.sync().unwrap();
    assert_eq!(log.unsynced_count(), 0);
}
