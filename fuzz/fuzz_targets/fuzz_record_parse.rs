#![no_main]

//! Fuzz target for record header parsing and message reassembly.
//!
//! The input is fed as-is to a record layer reading from memory, which
//! exercises both header formats, the overflow check and the defragmenter.
//! The same bytes are also wrapped in a standard handshake record header.

use std::io::{self, Read, Write};
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use tlsrecord::record::RecordHeader;
use tlsrecord::{Config, Expect, Progress, RecordLayer};

/// Maximum plaintext fragment size
const MAX_FRAGMENT_SIZE: usize = 16384;

struct Input<'a> {
    data: &'a [u8],
}

impl Read for Input<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

impl Write for Input<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn drain(data: &[u8]) {
    let config = Arc::new(Config::builder().max_handshake_len(1 << 16).build());
    let mut rl = RecordLayer::new(Input { data }, config, false);
    while let Ok(Progress::Ready(_)) = rl.get_message(Expect::Any) {}
}

fuzz_target!(|data: &[u8]| {
    let _ = RecordHeader::parse(data);

    drain(data);

    if !data.is_empty() {
        let frag_len = data.len().min(MAX_FRAGMENT_SIZE);

        let mut record = Vec::with_capacity(5 + frag_len);
        record.push(22u8); // ContentType::Handshake
        record.extend_from_slice(&[0x03, 0x03]); // TLS 1.2
        record.extend_from_slice(&(frag_len as u16).to_be_bytes());
        record.extend_from_slice(&data[..frag_len]);

        drain(&record);
    }
});
