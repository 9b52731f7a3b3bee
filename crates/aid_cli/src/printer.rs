//! Terminal output decoupled from the turn that produces it.
//!
//! Rendered updates go into a [`SyncBuffer`]. A background thread drains the
//! buffer into the terminal, so a slow terminal only ever blocks the turn once
//! the buffer is full.

use std::{
    io::{self, Write as _},
    thread::{self, JoinHandle},
};

use aid_syncbuffer::SyncBuffer;
use tracing::{trace, warn};

/// Bytes buffered between the renderer and the terminal.
const BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Debug)]
pub struct Printer {
    buffer: SyncBuffer,
    worker: Option<JoinHandle<io::Result<u64>>>,
}

impl Printer {
    pub fn new<W>(mut out: W) -> Self
    where
        W: io::Write + Send + 'static,
    {
        let buffer = SyncBuffer::new(BUFFER_CAPACITY);
        let mut reader = buffer.clone();

        let worker = thread::spawn(move || {
            let result = drain(&mut reader, &mut out);

            // Nobody reads anymore, writers must not wait for space.
            if result.is_err() {
                reader.close();
            }

            result
        });

        Self {
            buffer,
            worker: Some(worker),
        }
    }

    #[must_use]
    pub fn terminal() -> Self {
        Self::new(io::stdout())
    }

    /// Wait until everything written so far reached the terminal, then stop
    /// the background thread.
    pub fn finish(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.buffer.close();

        let Some(worker) = self.worker.take() else {
            return;
        };

        match worker.join() {
            Ok(Ok(total)) => trace!(bytes = total, "Printer finished."),
            Ok(Err(error)) => warn!(%error, "Printer failed."),
            Err(_) => warn!("Printer thread panicked."),
        }
    }
}

/// Copy everything from `reader` to `out` until the buffer is closed.
fn drain(reader: &mut SyncBuffer, out: &mut impl io::Write) -> io::Result<u64> {
    let mut total = 0;
    let mut chunk = [0; 4096];

    loop {
        let n = io::Read::read(reader, &mut chunk)?;
        if n == 0 {
            return Ok(total);
        }

        out.write_all(&chunk[..n])?;
        out.flush()?;
        total += n as u64;
    }
}

impl io::Write for Printer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write_all_blocking(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
