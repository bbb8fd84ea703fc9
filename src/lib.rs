//! tlsrecord
//!
//! The record layer of SSL 3.0 through TLS 1.2 over any `Read + Write`
//! stream.
//!
//! A [`RecordLayer`] turns a byte stream into typed protocol messages and
//! back. It frames records (including SSLv2 compatible headers on receive),
//! fragments and reassembles handshake messages, and protects records with
//! four cipher states: current and pending, for reading and writing. The
//! handshake itself lives above this crate; it hands down the master
//! secret, randoms and cipher suite and says when to activate pending state.
//!
//! # Non-blocking use
//!
//! The record layer never blocks on its own. With a non-blocking socket every
//! socket operation returns [`Progress`], and a `WantRead` or `WantWrite` is
//! resumed by calling the same operation again once the socket is ready.
//!
//! ```no_run
//! use std::net::TcpStream;
//! use std::sync::Arc;
//!
//! use tlsrecord::{Config, HandshakeType, Message, Progress, RecordLayer};
//!
//! let socket = TcpStream::connect("127.0.0.1:4433").unwrap();
//! socket.set_nonblocking(true).unwrap();
//!
//! let mut rl = RecordLayer::new(socket, Arc::new(Config::default()), true);
//! let hello = Message::handshake(HandshakeType::ClientHello, &[/* body */]);
//!
//! let mut progress = rl.send_message(&hello).unwrap();
//! while progress != Progress::Ready(()) {
//!     // wait for the socket to become writable
//!     progress = rl.flush().unwrap();
//! }
//! ```
//!
//! # Cryptography
//!
//! Ciphers, MACs, key expansion and transcript hashes come from a
//! [`CryptoProvider`](crypto::CryptoProvider). The built-in provider uses
//! the RustCrypto crates and is named `"rust-crypto"`.
//!
//! Supported cipher suites:
//!
//! - `TLS_RSA_WITH_NULL_SHA`, `TLS_RSA_WITH_NULL_SHA256`
//! - `TLS_{RSA,DHE_RSA,ECDHE_RSA}_WITH_AES_{128,256}_CBC_SHA`
//! - `TLS_RSA_WITH_AES_{128,256}_CBC_SHA256`
//! - `TLS_{RSA,ECDHE_RSA}_WITH_AES_128_GCM_SHA256`,
//!   `TLS_{RSA,ECDHE_RSA}_WITH_AES_256_GCM_SHA384`

#![forbid(unsafe_code)]
#![warn(clippy::all)]
// #![deny(missing_docs)]

#[macro_use]
extern crate log;

mod alert;
pub use alert::{Alert, AlertDescription, AlertLevel};

mod buffer;
pub use buffer::{Buf, BufferPool, TmpBuf};

mod codec;
pub use codec::{put_u24, Parser};

mod config;
pub use config::{Config, ConfigBuilder};

mod context;

pub mod crypto;

mod error;
pub use error::Error;

mod incoming;
mod outgoing;

pub mod record;
pub use record::{Message, ReceivedMessage, RecordHeader};

mod record_layer;
pub use record_layer::{Expect, Progress, RecordLayer};

mod rng;

pub mod types;
pub use types::{CipherSuite, ContentType, HandshakeType, ProtocolVersion};
