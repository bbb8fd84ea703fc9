//! Record framing, fragmentation and message reassembly.

mod fragment;
mod header;
mod message;

pub use fragment::{fragment, fragment_split_first, Defragmenter};
pub use header::{HeaderFormat, RecordHeader, STANDARD_HEADER_LEN};
pub use message::{Message, ReceivedMessage};

/// Largest plaintext carried in one record (2^14).
pub const MAX_PLAINTEXT_LEN: usize = 16384;

/// Largest record payload accepted from the wire, allowing for MAC,
/// padding and compression expansion.
pub const MAX_RECORD_PAYLOAD: usize = MAX_PLAINTEXT_LEN + 2048;

/// Handshake envelope header: `[type:1][length:3]`.
pub(crate) const HANDSHAKE_HEADER_LEN: usize = 4;
