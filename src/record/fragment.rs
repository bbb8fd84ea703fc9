use super::{ReceivedMessage, RecordHeader, HANDSHAKE_HEADER_LEN};
use crate::buffer::Buf;
use crate::types::ContentType;
use crate::Error;

/// Split `payload` into chunks of at most `max_len` bytes.
///
/// An empty payload gives one empty chunk so that empty messages still
/// produce a record.
pub fn fragment(payload: &[u8], max_len: usize) -> Vec<&[u8]> {
    if payload.is_empty() {
        return vec![payload];
    }
    payload.chunks(max_len.max(1)).collect()
}

/// Like [`fragment`], but the first chunk is a single byte.
///
/// This is the 1/n-1 record split that randomizes the implicit IV for
/// CBC suites before TLS 1.1.
pub fn fragment_split_first(payload: &[u8], max_len: usize) -> Vec<&[u8]> {
    if payload.len() <= 1 {
        return fragment(payload, max_len);
    }
    let mut chunks = vec![&payload[..1]];
    chunks.extend(fragment(&payload[1..], max_len));
    chunks
}

/// Reassembles messages from decrypted record payloads.
///
/// Only handshake messages may span records. A record of any other type
/// while a handshake message is incomplete is an `unexpected_message`.
#[derive(Debug)]
pub struct Defragmenter {
    buffer: Buf,
    max_handshake_len: usize,
}

impl Defragmenter {
    pub fn new(max_handshake_len: usize) -> Self {
        Defragmenter {
            buffer: Buf::new(),
            max_handshake_len,
        }
    }

    /// Whether part of a handshake message is waiting for more records.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feed one record and return every message it completed, in order.
    pub fn absorb(
        &mut self,
        header: &RecordHeader,
        payload: &[u8],
    ) -> Result<Vec<ReceivedMessage>, Error> {
        if header.ssl2 {
            self.ensure_not_interleaved(header.content_type)?;
            let msg = ReceivedMessage::new(*header, Buf::from_slice(payload));
            return Ok(vec![msg]);
        }

        match header.content_type {
            ContentType::Handshake => self.absorb_handshake(header, payload),
            ContentType::Alert
            | ContentType::ChangeCipherSpec
            | ContentType::ApplicationData
            | ContentType::Heartbeat => {
                self.ensure_not_interleaved(header.content_type)?;
                if payload.is_empty() {
                    return Err(Error::UnexpectedMessage(format!(
                        "empty {} record",
                        header.content_type
                    )));
                }
                let msg = ReceivedMessage::new(*header, Buf::from_slice(payload));
                Ok(vec![msg])
            }
            ContentType::Unknown(v) => Err(Error::UnexpectedMessage(format!(
                "unknown content type {}",
                v
            ))),
        }
    }

    fn ensure_not_interleaved(&self, content_type: ContentType) -> Result<(), Error> {
        if self.has_partial() {
            return Err(Error::UnexpectedMessage(format!(
                "{} record inside a fragmented handshake message",
                content_type
            )));
        }
        Ok(())
    }

    fn absorb_handshake(
        &mut self,
        header: &RecordHeader,
        payload: &[u8],
    ) -> Result<Vec<ReceivedMessage>, Error> {
        if payload.is_empty() && !self.has_partial() {
            return Err(Error::UnexpectedMessage(
                "empty handshake record".to_string(),
            ));
        }

        self.buffer.extend_from_slice(payload);

        let mut messages = Vec::new();
        loop {
            if self.buffer.len() < HANDSHAKE_HEADER_LEN {
                break;
            }
            let body_len = u32::from_be_bytes([0, self.buffer[1], self.buffer[2], self.buffer[3]])
                as usize;
            if body_len > self.max_handshake_len {
                let err = Error::DecodeError(format!(
                    "handshake message length {} exceeds {}",
                    body_len, self.max_handshake_len
                ));
                self.buffer.clear();
                return Err(err);
            }
            let total = HANDSHAKE_HEADER_LEN + body_len;
            if self.buffer.len() < total {
                break;
            }
            let bytes = Buf::from_slice(&self.buffer[..total]);
            self.buffer.consume(total);
            messages.push(ReceivedMessage::new(*header, bytes));
        }

        trace!(
            "Handshake record {} bytes: {} complete, {} buffered",
            payload.len(),
            messages.len(),
            self.buffer.len()
        );

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HandshakeType, ProtocolVersion};

    fn header(ct: ContentType, len: usize) -> RecordHeader {
        RecordHeader::new(ct, ProtocolVersion::TLS1_2, len as u16)
    }

    fn handshake_msg(ty: u8, body_len: usize) -> Vec<u8> {
        let mut v = vec![ty];
        v.extend_from_slice(&(body_len as u32).to_be_bytes()[1..]);
        v.extend((0..body_len).map(|i| i as u8));
        v
    }

    #[test]
    fn fragment_boundaries() {
        let max = 16384;
        for len in [0usize, 1, max - 1, max, max + 1, 10 * max] {
            let payload = vec![7u8; len];
            let chunks = fragment(&payload, max);
            assert!(!chunks.is_empty());
            assert!(chunks.iter().all(|c| c.len() <= max));
            assert_eq!(chunks.concat(), payload);
            let expected = if len == 0 { 1 } else { len.div_ceil(max) };
            assert_eq!(chunks.len(), expected, "len {}", len);
        }
    }

    #[test]
    fn split_first_gives_one_byte_chunk() {
        let payload = vec![1u8; 100];
        let chunks = fragment_split_first(&payload, 64);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1);
        assert_eq!(chunks[1].len(), 64);
        assert_eq!(chunks[2].len(), 35);

        assert_eq!(fragment_split_first(&[1], 64).len(), 1);
    }

    #[test]
    fn three_messages_in_one_record() {
        let mut d = Defragmenter::new(1 << 17);
        let mut payload = handshake_msg(2, 10);
        payload.extend(handshake_msg(11, 0));
        payload.extend(handshake_msg(14, 0));
        let msgs = d.absorb(&header(ContentType::Handshake, payload.len()), &payload).unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].handshake_type(), Some(HandshakeType::ServerHello));
        assert_eq!(msgs[0].body().len(), 10);
        assert_eq!(msgs[1].handshake_type(), Some(HandshakeType::Certificate));
        assert_eq!(msgs[2].handshake_type(), Some(HandshakeType::ServerHelloDone));
        assert!(!d.has_partial());
    }

    #[test]
    fn message_spanning_records() {
        let mut d = Defragmenter::new(1 << 17);
        let msg = handshake_msg(11, 20_000);
        let (a, b) = msg.split_at(16384);
        assert!(d.absorb(&header(ContentType::Handshake, a.len()), a).unwrap().is_empty());
        assert!(d.has_partial());
        let out = d.absorb(&header(ContentType::Handshake, b.len()), b).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bytes(), &msg[..]);
    }

    #[test]
    fn header_split_across_records() {
        let mut d = Defragmenter::new(1 << 17);
        let msg = handshake_msg(20, 12);
        assert!(d.absorb(&header(ContentType::Handshake, 2), &msg[..2]).unwrap().is_empty());
        let out = d.absorb(&header(ContentType::Handshake, 12), &msg[2..]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].body().len(), 12);
    }

    #[test]
    fn interleaving_rejected() {
        let mut d = Defragmenter::new(1 << 17);
        let msg = handshake_msg(11, 100);
        d.absorb(&header(ContentType::Handshake, 50), &msg[..50]).unwrap();
        let err = d
            .absorb(&header(ContentType::ApplicationData, 1), &[1])
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedMessage(_)));
    }

    #[test]
    fn empty_records() {
        let mut d = Defragmenter::new(1 << 17);
        for ct in [
            ContentType::Alert,
            ContentType::ChangeCipherSpec,
            ContentType::ApplicationData,
            ContentType::Heartbeat,
        ] {
            assert!(matches!(
                d.absorb(&header(ct, 0), &[]),
                Err(Error::UnexpectedMessage(_))
            ));
        }

        // Empty handshake record with nothing buffered
        assert!(matches!(
            d.absorb(&header(ContentType::Handshake, 0), &[]),
            Err(Error::UnexpectedMessage(_))
        ));

        // Accepted while a message is in flight
        let msg = handshake_msg(11, 10);
        d.absorb(&header(ContentType::Handshake, 5), &msg[..5]).unwrap();
        assert!(d.absorb(&header(ContentType::Handshake, 0), &[]).unwrap().is_empty());
        let out = d.absorb(&header(ContentType::Handshake, 9), &msg[5..]).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn oversized_handshake_rejected_early() {
        let mut d = Defragmenter::new(1000);
        let msg = handshake_msg(11, 1001);
        let err = d
            .absorb(&header(ContentType::Handshake, 4), &msg[..4])
            .unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn unknown_type_rejected() {
        let mut d = Defragmenter::new(1000);
        let err = d
            .absorb(&header(ContentType::Unknown(99), 1), &[0])
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedMessage(_)));
    }

    #[test]
    fn ssl2_record_is_one_message() {
        let mut d = Defragmenter::new(1000);
        let (h, _) = RecordHeader::parse(&[0x80, 0x03]).unwrap();
        let out = d.absorb(&h, &[1, 3, 1]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bytes(), &[1, 3, 1]);
        assert_eq!(out[0].body(), &[1, 3, 1]);
        assert_eq!(out[0].handshake_type(), Some(HandshakeType::ClientHello));
    }
}
