use std::fmt;

use super::{RecordHeader, HANDSHAKE_HEADER_LEN};
use crate::alert::Alert;
use crate::buffer::Buf;
use crate::codec::{put_u24, Parser};
use crate::types::{ContentType, HandshakeType};

const MAX_HANDSHAKE_BODY: usize = 0xff_ffff;

/// An outgoing protocol message, serialized and ready to fragment.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    content_type: ContentType,
    bytes: Vec<u8>,
}

impl Message {
    /// Handshake message: `[type:1][length:3][body]`.
    ///
    /// Bodies are limited to 2^24 - 1 bytes by the envelope. Longer bodies
    /// are truncated so the declared length always matches.
    pub fn handshake(handshake_type: HandshakeType, body: &[u8]) -> Self {
        let body = if body.len() > MAX_HANDSHAKE_BODY {
            warn!(
                "Truncating {} body of {} bytes to {}",
                handshake_type,
                body.len(),
                MAX_HANDSHAKE_BODY
            );
            &body[..MAX_HANDSHAKE_BODY]
        } else {
            body
        };
        let mut bytes = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
        bytes.push(handshake_type.as_u8());
        put_u24(&mut bytes, body.len() as u32);
        bytes.extend_from_slice(body);
        Message {
            content_type: ContentType::Handshake,
            bytes,
        }
    }

    pub fn alert(alert: Alert) -> Self {
        let mut bytes = Vec::with_capacity(2);
        alert.serialize(&mut bytes);
        Message {
            content_type: ContentType::Alert,
            bytes,
        }
    }

    pub fn change_cipher_spec() -> Self {
        Message {
            content_type: ContentType::ChangeCipherSpec,
            bytes: vec![1],
        }
    }

    pub fn application_data(data: &[u8]) -> Self {
        Message::raw(ContentType::ApplicationData, data.to_vec())
    }

    pub fn heartbeat(data: &[u8]) -> Self {
        Message::raw(ContentType::Heartbeat, data.to_vec())
    }

    /// Already serialized bytes of any content type.
    pub fn raw(content_type: ContentType, bytes: Vec<u8>) -> Self {
        Message {
            content_type,
            bytes,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Type tag of a handshake message.
    pub fn handshake_type(&self) -> Option<HandshakeType> {
        if self.content_type != ContentType::Handshake {
            return None;
        }
        self.bytes.first().map(|b| HandshakeType::from_u8(*b))
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A complete message taken off the wire.
///
/// For handshake messages the bytes include the four byte envelope header.
/// An SSLv2 record is delivered whole as it arrived.
pub struct ReceivedMessage {
    header: RecordHeader,
    bytes: Buf,
}

impl ReceivedMessage {
    pub(crate) fn new(header: RecordHeader, bytes: Buf) -> Self {
        ReceivedMessage { header, bytes }
    }

    /// Header of the record that completed this message.
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn content_type(&self) -> ContentType {
        self.header.content_type
    }

    /// Type tag for handshake messages, including SSLv2 records whose first
    /// byte is the message type.
    pub fn handshake_type(&self) -> Option<HandshakeType> {
        if self.header.content_type != ContentType::Handshake {
            return None;
        }
        self.bytes.first().map(|b| HandshakeType::from_u8(*b))
    }

    /// The complete message bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The message without its handshake envelope header.
    pub fn body(&self) -> &[u8] {
        if self.header.content_type == ContentType::Handshake && !self.header.ssl2 {
            &self.bytes[HANDSHAKE_HEADER_LEN.min(self.bytes.len())..]
        } else {
            &self.bytes
        }
    }

    /// Cursor over the complete message bytes.
    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.bytes)
    }

    pub fn into_bytes(self) -> Buf {
        self.bytes
    }
}

impl fmt::Debug for ReceivedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedMessage")
            .field("content_type", &self.header.content_type)
            .field("ssl2", &self.header.ssl2)
            .field("len", &self.bytes.len())
            .finish()
    }
}
