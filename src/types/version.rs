use std::fmt;

use nom::number::complete::be_u8;
use nom::IResult;

/// Protocol version as carried in the record header.
///
/// Ordering is lexicographic on `(major, minor)`, which matches the
/// chronological order of SSL 3.0 through TLS 1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    /// Synthesized for records that arrive in SSLv2 framing.
    pub const SSL2: ProtocolVersion = ProtocolVersion::new(2, 0);
    pub const SSL3_0: ProtocolVersion = ProtocolVersion::new(3, 0);
    pub const TLS1_0: ProtocolVersion = ProtocolVersion::new(3, 1);
    pub const TLS1_1: ProtocolVersion = ProtocolVersion::new(3, 2);
    pub const TLS1_2: ProtocolVersion = ProtocolVersion::new(3, 3);

    pub const fn new(major: u8, minor: u8) -> Self {
        ProtocolVersion { major, minor }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], ProtocolVersion> {
        let (input, major) = be_u8(input)?;
        let (input, minor) = be_u8(input)?;
        Ok((input, ProtocolVersion { major, minor }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.major);
        output.push(self.minor);
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.major, self.minor]
    }

    /// SSL 3.0 uses its own MAC, PRF and padding rules.
    pub fn is_ssl3(&self) -> bool {
        *self == Self::SSL3_0
    }

    /// TLS 1.1 and up carry an explicit IV in every CBC record.
    pub fn has_explicit_iv(&self) -> bool {
        *self >= Self::TLS1_1
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::TLS1_0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.major, self.minor) {
            (3, 0) => write!(f, "SSL 3.0"),
            (3, 1) => write!(f, "TLS 1.0"),
            (3, 2) => write!(f, "TLS 1.1"),
            (3, 3) => write!(f, "TLS 1.2"),
            (major, minor) => write!(f, "unknown ({}, {})", major, minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        assert!(ProtocolVersion::SSL3_0 < ProtocolVersion::TLS1_0);
        assert!(ProtocolVersion::TLS1_1 < ProtocolVersion::TLS1_2);
        assert!(ProtocolVersion::SSL2 < ProtocolVersion::SSL3_0);
        assert!(ProtocolVersion::new(4, 0) > ProtocolVersion::TLS1_2);
    }

    #[test]
    fn version_names() {
        assert_eq!(ProtocolVersion::SSL3_0.to_string(), "SSL 3.0");
        assert_eq!(ProtocolVersion::TLS1_0.to_string(), "TLS 1.0");
        assert_eq!(ProtocolVersion::TLS1_1.to_string(), "TLS 1.1");
        assert_eq!(ProtocolVersion::TLS1_2.to_string(), "TLS 1.2");
    }

    #[test]
    fn parse_two_bytes() {
        let (rest, v) = ProtocolVersion::parse(&[3, 3, 0xff]).unwrap();
        assert_eq!(v, ProtocolVersion::TLS1_2);
        assert_eq!(rest, &[0xff]);
    }
}
