use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use super::MAX_RECORD_PAYLOAD;
use crate::buffer::Buf;
use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

/// Length of a standard SSLv3/TLS record header.
pub const STANDARD_HEADER_LEN: usize = 5;

/// Header layout, decided by the first byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// `[type:1][major:1][minor:1][length:2]`
    Standard,
    /// SSLv2 two byte header, high bit set.
    Ssl2Short,
    /// SSLv2 three byte header with a padding byte, 0x80 and 0x40 set.
    Ssl2Long,
}

impl HeaderFormat {
    pub fn detect(first: u8) -> Self {
        if first & 0x80 == 0 {
            HeaderFormat::Standard
        } else if first & 0x40 != 0 {
            HeaderFormat::Ssl2Long
        } else {
            HeaderFormat::Ssl2Short
        }
    }

    pub fn header_len(&self) -> usize {
        match self {
            HeaderFormat::Standard => STANDARD_HEADER_LEN,
            HeaderFormat::Ssl2Short => 2,
            HeaderFormat::Ssl2Long => 3,
        }
    }

    /// Decode a complete header of this format.
    ///
    /// A declared length above [`MAX_RECORD_PAYLOAD`] is a `record_overflow`.
    pub fn parse(&self, input: &[u8]) -> Result<RecordHeader, Error> {
        let (_, header) = match self {
            HeaderFormat::Standard => parse_standard(input)?,
            HeaderFormat::Ssl2Short => parse_ssl2_short(input)?,
            HeaderFormat::Ssl2Long => parse_ssl2_long(input)?,
        };
        if header.length as usize > MAX_RECORD_PAYLOAD {
            return Err(Error::RecordOverflow(header.length as usize));
        }
        Ok(header)
    }
}

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub length: u16,
    /// Arrived in SSLv2 framing.
    pub ssl2: bool,
    /// Padding byte of a three byte SSLv2 header, otherwise 0.
    pub padding: u8,
}

impl RecordHeader {
    pub fn new(content_type: ContentType, version: ProtocolVersion, length: u16) -> Self {
        RecordHeader {
            content_type,
            version,
            length,
            ssl2: false,
            padding: 0,
        }
    }

    /// Decode a header from the start of `input`, picking the format from
    /// the first byte. Returns the header and the bytes it occupied.
    pub fn parse(input: &[u8]) -> Result<(RecordHeader, usize), Error> {
        let first = *input
            .first()
            .ok_or_else(|| Error::DecodeError("empty record header".into()))?;
        let format = HeaderFormat::detect(first);
        let header = format.parse(input)?;
        Ok((header, format.header_len()))
    }

    /// Write a standard header. SSLv2 headers are never sent.
    pub fn serialize(&self, output: &mut Buf) {
        output.push(self.content_type.as_u8());
        output.extend_from_slice(&self.version.to_bytes());
        output.extend_from_slice(&self.length.to_be_bytes());
    }
}

fn parse_standard(input: &[u8]) -> IResult<&[u8], RecordHeader> {
    let (input, content_type) = ContentType::parse(input)?;
    let (input, version) = ProtocolVersion::parse(input)?;
    let (input, length) = be_u16(input)?;
    Ok((input, RecordHeader::new(content_type, version, length)))
}

fn ssl2_header(length: u16, padding: u8) -> RecordHeader {
    RecordHeader {
        content_type: ContentType::Handshake,
        version: ProtocolVersion::SSL2,
        length,
        ssl2: true,
        padding,
    }
}

fn parse_ssl2_short(input: &[u8]) -> IResult<&[u8], RecordHeader> {
    let (input, b0) = be_u8(input)?;
    let (input, b1) = be_u8(input)?;
    let length = (((b0 & 0x7f) as u16) << 8) | b1 as u16;
    Ok((input, ssl2_header(length, 0)))
}

fn parse_ssl2_long(input: &[u8]) -> IResult<&[u8], RecordHeader> {
    let (input, b0) = be_u8(input)?;
    let (input, b1) = be_u8(input)?;
    let (input, padding) = be_u8(input)?;
    let length = (((b0 & 0x3f) as u16) << 8) | b1 as u16;
    Ok((input, ssl2_header(length, padding)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_header() {
        let (header, len) = RecordHeader::parse(&[0x16, 0x03, 0x01, 0x00, 0x2a]).unwrap();
        assert_eq!(len, 5);
        assert_eq!(header.content_type, ContentType::Handshake);
        assert_eq!(header.version, ProtocolVersion::TLS1_0);
        assert_eq!(header.length, 42);
        assert!(!header.ssl2);

        let mut out = Buf::new();
        header.serialize(&mut out);
        assert_eq!(&out[..], &[0x16, 0x03, 0x01, 0x00, 0x2a]);
    }

    #[test]
    fn ssl2_short_header() {
        let (header, len) = RecordHeader::parse(&[0x80, 0x2e]).unwrap();
        assert_eq!(len, 2);
        assert!(header.ssl2);
        assert_eq!(header.length, 0x2e);
        assert_eq!(header.content_type, ContentType::Handshake);
        assert_eq!(header.version, ProtocolVersion::SSL2);
        assert_eq!(header.padding, 0);
    }

    #[test]
    fn ssl2_long_header() {
        let (header, len) = RecordHeader::parse(&[0xc1, 0x00, 0x07]).unwrap();
        assert_eq!(len, 3);
        assert!(header.ssl2);
        assert_eq!(header.length, 0x0100);
        assert_eq!(header.padding, 7);
    }

    #[test]
    fn format_detection() {
        assert_eq!(HeaderFormat::detect(0x17), HeaderFormat::Standard);
        assert_eq!(HeaderFormat::detect(0x80), HeaderFormat::Ssl2Short);
        assert_eq!(HeaderFormat::detect(0xbf), HeaderFormat::Ssl2Short);
        assert_eq!(HeaderFormat::detect(0xc0), HeaderFormat::Ssl2Long);
    }

    #[test]
    fn oversized_length_rejected() {
        let too_big = (MAX_RECORD_PAYLOAD + 1) as u16;
        let [hi, lo] = too_big.to_be_bytes();
        let err = RecordHeader::parse(&[0x17, 0x03, 0x03, hi, lo]).unwrap_err();
        assert!(matches!(err, Error::RecordOverflow(n) if n == MAX_RECORD_PAYLOAD + 1));

        let [hi, lo] = (MAX_RECORD_PAYLOAD as u16).to_be_bytes();
        assert!(RecordHeader::parse(&[0x17, 0x03, 0x03, hi, lo]).is_ok());

        // SSLv2 lengths stay below the bound.
        let (header, _) = RecordHeader::parse(&[0xbf, 0xff]).unwrap();
        assert_eq!(header.length, 0x3fff);
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(
            HeaderFormat::Standard.parse(&[0x16, 0x03]),
            Err(Error::DecodeError(_))
        ));
    }
}
