use std::{
    io::{ErrorKind, Read as _, Write as _},
    thread,
    time::Duration,
};

use pretty_assertions::assert_eq;
use test_log::test;

use super::*;

#[test]
fn test_wraparound_through_threads() {
    let buffer = SyncBuffer::new(7);
    let data = (0..=255_u8).cycle().take(10_000).collect::<Vec<_>>();

    let writer = {
        let buffer = buffer.clone();
        let data = data.clone();
        thread::spawn(move || {
            for chunk in data.chunks(5) {
                buffer.write_all_blocking(chunk).unwrap();
            }
            buffer.close();
        })
    };

    let mut out = vec![];
    (&buffer).read_to_end(&mut out).unwrap();
    writer.join().unwrap();

    assert_eq!(out.len(), data.len());
    assert_eq!(out, data);
}

#[test]
fn test_reads_drain_after_close() {
    let mut buffer = SyncBuffer::new(4);
    buffer.write_all(b"abc").unwrap();
    buffer.close();

    let mut out = [0; 2];
    assert_eq!(buffer.read(&mut out).unwrap(), 2);
    assert_eq!(&out, b"ab");
    assert_eq!(buffer.read(&mut out).unwrap(), 1);
    assert_eq!(out[0], b'c');
    assert_eq!(buffer.read(&mut out).unwrap(), 0);
}

#[test]
fn test_write_after_close_is_broken_pipe() {
    let mut buffer = SyncBuffer::new(4);
    buffer.close();

    let error = buffer.write(b"x").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::BrokenPipe);
}

#[test]
fn test_close_wakes_blocked_writer() {
    let buffer = SyncBuffer::new(2);

    let writer = {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.write_all_blocking(b"abcd"))
    };

    while buffer.free() > 0 {
        thread::sleep(Duration::from_millis(1));
    }
    buffer.close();

    let error = writer.join().unwrap().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::BrokenPipe);

    let mut out = vec![];
    (&buffer).read_to_end(&mut out).unwrap();
    assert_eq!(out, b"ab");
}

#[test]
fn test_close_wakes_blocked_reader() {
    let buffer = SyncBuffer::new(2);

    let reader = {
        let buffer = buffer.clone();
        thread::spawn(move || {
            let mut out = [0; 8];
            (&buffer).read(&mut out).unwrap()
        })
    };

    thread::sleep(Duration::from_millis(10));
    buffer.close();

    assert_eq!(reader.join().unwrap(), 0);
}

#[test]
fn test_counters() {
    let buffer = SyncBuffer::new(0);
    assert_eq!(buffer.capacity(), 1);

    let buffer = SyncBuffer::new(5);
    (&buffer).write_all(b"abc").unwrap();

    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.free(), 2);
    assert!(!buffer.is_empty());
    assert!(!buffer.is_closed());

    buffer.close();
    buffer.close();
    assert!(buffer.is_closed());
}
