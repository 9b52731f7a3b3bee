//! A bounded byte ring buffer shared by one writer and one reader thread.
//!
//! Writers block while the buffer is full, readers block while it is empty.
//! [`SyncBuffer::close`] wakes both sides: readers drain what is left and
//! then see end-of-stream, writers get [`io::ErrorKind::BrokenPipe`].

use std::{io, sync::Arc};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug)]
struct Ring {
    buf: Box<[u8]>,

    /// Index of the oldest unread byte.
    start: usize,
    len: usize,
    closed: bool,
}

impl Ring {
    fn free(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Copy as much of `data` as fits. Returns the number of bytes taken.
    fn push(&mut self, data: &[u8]) -> usize {
        let cap = self.buf.len();
        let n = data.len().min(self.free());
        let end = (self.start + self.len) % cap;

        let first = n.min(cap - end);
        self.buf[end..end + first].copy_from_slice(&data[..first]);
        self.buf[..n - first].copy_from_slice(&data[first..n]);

        self.len += n;
        n
    }

    /// Copy as many buffered bytes into `out` as fit. Returns the count.
    fn pop(&mut self, out: &mut [u8]) -> usize {
        let cap = self.buf.len();
        let n = out.len().min(self.len);

        let first = n.min(cap - self.start);
        out[..first].copy_from_slice(&self.buf[self.start..self.start + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);

        self.start = (self.start + n) % cap;
        self.len -= n;
        n
    }
}

#[derive(Debug)]
struct Shared {
    ring: Mutex<Ring>,
    changed: Condvar,
}

/// A thread-safe, bounded byte FIFO.
///
/// Clones refer to the same buffer, so one clone can be handed to the
/// writing thread and another to the reading thread.
#[derive(Debug, Clone)]
pub struct SyncBuffer {
    shared: Arc<Shared>,
}

impl SyncBuffer {
    /// Create a buffer holding up to `capacity` bytes. A capacity of zero is
    /// rounded up to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let ring = Ring {
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            start: 0,
            len: 0,
            closed: false,
        };

        Self {
            shared: Arc::new(Shared {
                ring: Mutex::new(ring),
                changed: Condvar::new(),
            }),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().buf.len()
    }

    /// Bytes waiting to be read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes that can be written without blocking.
    #[must_use]
    pub fn free(&self) -> usize {
        self.lock().free()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stop accepting writes. Blocked readers and writers wake up.
    ///
    /// Closing twice is harmless.
    pub fn close(&self) {
        let mut ring = self.lock();
        if !ring.closed {
            trace!(unread = ring.len, "Closing buffer.");
        }

        ring.closed = true;
        self.shared.changed.notify_all();
    }

    /// Write all of `data`, blocking while the buffer is full.
    ///
    /// If the buffer is closed part way, the bytes written so far stay in the
    /// buffer and the write fails.
    pub fn write_all_blocking(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            let n = self.write_some(data)?;
            data = &data[n..];
        }

        Ok(())
    }

    /// Write at least one byte of `data`, blocking while the buffer is full.
    fn write_some(&self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut ring = self.lock();
        loop {
            if ring.closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "buffer closed"));
            }

            if ring.free() > 0 {
                break;
            }

            self.shared.changed.wait(&mut ring);
        }

        let n = ring.push(data);
        self.shared.changed.notify_all();

        Ok(n)
    }

    /// Read at least one byte, blocking while the buffer is empty. Returns
    /// zero once the buffer is closed and drained.
    fn read_some(&self, out: &mut [u8]) -> usize {
        if out.is_empty() {
            return 0;
        }

        let mut ring = self.lock();
        while ring.len == 0 {
            if ring.closed {
                return 0;
            }

            self.shared.changed.wait(&mut ring);
        }

        let n = ring.pop(out);
        self.shared.changed.notify_all();

        n
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.shared.ring.lock()
    }
}

impl io::Write for SyncBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_some(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &SyncBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_some(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for SyncBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_some(buf))
    }
}

impl io::Read for &SyncBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_some(buf))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
