use std::fmt;

use nom::number::complete::be_u8;
use nom::IResult;

/// Record content type (RFC 5246 §6.2.1, RFC 6520).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Heartbeat,
    Unknown(u8),
}

impl ContentType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            24 => ContentType::Heartbeat,
            _ => ContentType::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Heartbeat => 24,
            ContentType::Unknown(value) => *value,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ContentType> {
        let (input, byte) = be_u8(input)?;
        Ok((input, Self::from_u8(byte)))
    }

    /// Whether records of this type carry messages that may span records.
    ///
    /// Only handshake messages are reassembled. Everything else is one
    /// message per record.
    pub fn is_fragmentable(&self) -> bool {
        matches!(self, ContentType::Handshake)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::ChangeCipherSpec => write!(f, "change_cipher_spec"),
            ContentType::Alert => write!(f, "alert"),
            ContentType::Handshake => write!(f, "handshake"),
            ContentType::ApplicationData => write!(f, "application_data"),
            ContentType::Heartbeat => write!(f, "heartbeat"),
            ContentType::Unknown(v) => write!(f, "unknown({})", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_map_both_ways() {
        for v in 20..=24u8 {
            let ct = ContentType::from_u8(v);
            assert!(!matches!(ct, ContentType::Unknown(_)));
            assert_eq!(ct.as_u8(), v);
        }
        assert_eq!(ContentType::from_u8(99), ContentType::Unknown(99));
    }

    #[test]
    fn only_handshake_is_fragmentable() {
        assert!(ContentType::Handshake.is_fragmentable());
        assert!(!ContentType::Alert.is_fragmentable());
        assert!(!ContentType::ApplicationData.is_fragmentable());
    }
}
