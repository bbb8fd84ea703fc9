//! Shared helpers for record layer integration tests.
//!
//! Import from test files via `mod common;`.

#![allow(unused)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

use tlsrecord::{Config, Progress, ProtocolVersion, RecordLayer};

pub const MASTER_SECRET: [u8; 48] = [0x0b; 48];
pub const CLIENT_RANDOM: [u8; 32] = [0x0c; 32];
pub const SERVER_RANDOM: [u8; 32] = [0x0d; 32];

/// In-memory socket.
///
/// Reads come from `input`. An empty `input` blocks, or reads as EOF once
/// `eof` is set. Writes are recorded in `sent`, one entry per call in
/// `writes`. `write_budget` limits the bytes accepted before writes block.
#[derive(Debug, Default)]
pub struct MockSocket {
    pub input: VecDeque<u8>,
    pub eof: bool,
    /// Upper bound on bytes returned by one read.
    pub read_chunk: Option<usize>,
    /// Upcoming reads that report WouldBlock before any data.
    pub blocked_reads: usize,
    pub sent: Vec<u8>,
    pub writes: Vec<usize>,
    pub write_budget: Option<usize>,
}

impl MockSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn take_sent(&mut self) -> Vec<u8> {
        self.writes.clear();
        std::mem::take(&mut self.sent)
    }
}

impl Read for MockSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.blocked_reads > 0 {
            self.blocked_reads -= 1;
            return Err(io::ErrorKind::WouldBlock.into());
        }
        if self.input.is_empty() {
            if self.eof {
                return Ok(0);
            }
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let limit = self.read_chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(self.input.len()).min(limit);
        for (dst, src) in buf.iter_mut().zip(self.input.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for MockSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match self.write_budget {
            Some(0) => return Err(io::ErrorKind::WouldBlock.into()),
            Some(budget) => {
                let n = budget.min(buf.len());
                self.write_budget = Some(budget - n);
                n
            }
            None => buf.len(),
        };
        self.sent.extend_from_slice(&buf[..n]);
        self.writes.push(n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn config() -> Arc<Config> {
    Arc::new(Config::builder().rng_seed(42).build())
}

pub fn layer(is_client: bool, version: ProtocolVersion) -> RecordLayer<MockSocket> {
    layer_with(is_client, version, config())
}

pub fn layer_with(
    is_client: bool,
    version: ProtocolVersion,
    config: Arc<Config>,
) -> RecordLayer<MockSocket> {
    let mut rl = RecordLayer::new(MockSocket::new(), config, is_client);
    rl.set_version(version);
    rl
}

/// Client and server with `suite` derived and active in both directions.
pub fn encrypted_pair(
    suite: u16,
    version: ProtocolVersion,
) -> (RecordLayer<MockSocket>, RecordLayer<MockSocket>) {
    let mut client = layer(true, version);
    let mut server = layer(false, version);
    for rl in [&mut client, &mut server] {
        rl.calc_pending_states(suite, &MASTER_SECRET, &CLIENT_RANDOM, &SERVER_RANDOM)
            .expect("calc_pending_states");
        rl.change_read_state().expect("read state");
        rl.change_write_state().expect("write state");
    }
    (client, server)
}

/// Move everything `from` has written into `to`'s input.
pub fn transfer(from: &mut RecordLayer<MockSocket>, to: &mut RecordLayer<MockSocket>) {
    let bytes = from.socket_mut().take_sent();
    to.socket_mut().feed(&bytes);
}

/// Record headers (type, version, length) in a byte stream of standard records.
pub fn split_records(mut bytes: &[u8]) -> Vec<(u8, (u8, u8), usize)> {
    let mut out = Vec::new();
    while bytes.len() >= 5 {
        let len = u16::from_be_bytes([bytes[3], bytes[4]]) as usize;
        out.push((bytes[0], (bytes[1], bytes[2]), len));
        bytes = &bytes[(5 + len).min(bytes.len())..];
    }
    out
}

pub fn record(content_type: u8, version: ProtocolVersion, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![content_type, version.major, version.minor];
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn handshake(ty: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![ty];
    out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(body);
    out
}

pub fn ready<T>(p: Progress<T>) -> T {
    match p {
        Progress::Ready(v) => v,
        Progress::WantRead => panic!("unexpected WantRead"),
        Progress::WantWrite => panic!("unexpected WantWrite"),
    }
}
