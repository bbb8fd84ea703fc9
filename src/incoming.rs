use std::fmt;
use std::io::{ErrorKind, Read};
use std::mem;

use crate::buffer::{Buf, BufferPool};
use crate::record::{HeaderFormat, RecordHeader, STANDARD_HEADER_LEN};
use crate::{Error, Progress};

/// Resumable reader of one record at a time.
///
/// Partial header and payload bytes survive a `WouldBlock`, so the next call
/// continues where the last one stopped.
pub(crate) struct RecordReader {
    header: [u8; STANDARD_HEADER_LEN],
    header_filled: usize,
    format: Option<HeaderFormat>,
    parsed: Option<RecordHeader>,
    payload: Buf,
    payload_filled: usize,
}

impl RecordReader {
    pub fn new() -> Self {
        RecordReader {
            header: [0; STANDARD_HEADER_LEN],
            header_filled: 0,
            format: None,
            parsed: None,
            payload: Buf::new(),
            payload_filled: 0,
        }
    }

    /// Whether part of a record has been read.
    #[cfg(test)]
    pub fn in_progress(&self) -> bool {
        self.header_filled > 0
    }

    /// Read until one complete record is available.
    ///
    /// The payload is handed out in a buffer taken from `pool`.
    pub fn poll_read<S: Read>(
        &mut self,
        socket: &mut S,
        pool: &mut BufferPool,
    ) -> Result<Progress<(RecordHeader, Buf)>, Error> {
        if self.parsed.is_none() {
            if self.format.is_none() {
                match read_some(socket, &mut self.header[..1])? {
                    Some(_) => {}
                    None => return Ok(Progress::WantRead),
                }
                self.header_filled = 1;
                self.format = Some(HeaderFormat::detect(self.header[0]));
            }

            let format = match self.format {
                Some(f) => f,
                None => return Ok(Progress::WantRead),
            };
            let header_len = format.header_len();

            while self.header_filled < header_len {
                match read_some(socket, &mut self.header[self.header_filled..header_len])? {
                    Some(n) => self.header_filled += n,
                    None => return Ok(Progress::WantRead),
                }
            }

            let header = format.parse(&self.header[..header_len])?;
            trace!("Record header {:?}", header);

            self.payload = pool.pop();
            self.payload.resize(header.length as usize, 0);
            self.payload_filled = 0;
            self.parsed = Some(header);
        }

        while self.payload_filled < self.payload.len() {
            match read_some(socket, &mut self.payload[self.payload_filled..])? {
                Some(n) => self.payload_filled += n,
                None => return Ok(Progress::WantRead),
            }
        }

        let header = match self.parsed.take() {
            Some(h) => h,
            None => return Ok(Progress::WantRead),
        };
        let payload = mem::take(&mut self.payload);
        self.reset();

        Ok(Progress::Ready((header, payload)))
    }

    fn reset(&mut self) {
        self.header_filled = 0;
        self.format = None;
        self.parsed = None;
        self.payload_filled = 0;
    }
}

/// Read into `buf`, retrying on `Interrupted`.
///
/// `Ok(None)` means `WouldBlock`. End of stream is an abrupt close.
fn read_some<S: Read>(socket: &mut S, buf: &mut [u8]) -> Result<Option<usize>, Error> {
    loop {
        match socket.read(buf) {
            Ok(0) => return Err(Error::AbruptClose),
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

impl fmt::Debug for RecordReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReader")
            .field("header_filled", &self.header_filled)
            .field("format", &self.format)
            .field("payload_filled", &self.payload_filled)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
