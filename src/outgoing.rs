use std::collections::VecDeque;
use std::fmt;
use std::io::{self, ErrorKind, Write};

use crate::buffer::{Buf, BufferPool};
use crate::{Error, Progress};

/// Queue of framed records waiting for the socket.
///
/// Records are written strictly in order. `offset` counts the bytes of the
/// front record that already went out.
pub(crate) struct RecordWriter {
    queue: VecDeque<Buf>,
    offset: usize,
}

impl RecordWriter {
    pub fn new() -> Self {
        RecordWriter {
            queue: VecDeque::new(),
            offset: 0,
        }
    }

    pub fn push(&mut self, record: Buf) {
        self.queue.push_back(record);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Bytes not yet handed to the socket.
    pub fn pending_len(&self) -> usize {
        let total: usize = self.queue.iter().map(|b| b.len()).sum();
        total - self.offset
    }

    /// Write queued records until the queue is empty or the socket blocks.
    ///
    /// Finished buffers go back to `pool`.
    pub fn poll_flush<S: Write>(
        &mut self,
        socket: &mut S,
        pool: &mut BufferPool,
    ) -> Result<Progress<()>, Error> {
        while let Some(front) = self.queue.front() {
            match socket.write(&front[self.offset..]) {
                Ok(0) => {
                    return Err(Error::Io(io::Error::new(
                        ErrorKind::WriteZero,
                        "socket accepted no bytes",
                    )))
                }
                Ok(n) => {
                    self.offset += n;
                    if self.offset == front.len() {
                        self.offset = 0;
                        if let Some(done) = self.queue.pop_front() {
                            pool.push(done);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Progress::WantWrite),
                Err(e) => return Err(e.into()),
            }
        }

        loop {
            match socket.flush() {
                Ok(()) => return Ok(Progress::Ready(())),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Progress::WantWrite),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl fmt::Debug for RecordWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordWriter")
            .field("records", &self.queue.len())
            .field("pending_bytes", &self.pending_len())
            .finish()
    }
}
