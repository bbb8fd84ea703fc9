//! Alert messages (RFC 5246 §7.2).

use std::fmt;

use nom::number::complete::be_u8;
use nom::IResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertLevel {
    Warning,
    Fatal,
    Unknown(u8),
}

impl AlertLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AlertLevel::Warning,
            2 => AlertLevel::Fatal,
            _ => AlertLevel::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            AlertLevel::Warning => 1,
            AlertLevel::Fatal => 2,
            AlertLevel::Unknown(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertDescription {
    CloseNotify,
    UnexpectedMessage,
    BadRecordMac,
    DecryptionFailed,
    RecordOverflow,
    DecompressionFailure,
    HandshakeFailure,
    NoCertificate,
    BadCertificate,
    UnsupportedCertificate,
    CertificateRevoked,
    CertificateExpired,
    CertificateUnknown,
    IllegalParameter,
    UnknownCa,
    AccessDenied,
    DecodeError,
    DecryptError,
    ExportRestriction,
    ProtocolVersion,
    InsufficientSecurity,
    InternalError,
    InappropriateFallback,
    UserCanceled,
    NoRenegotiation,
    UnsupportedExtension,
    UnknownPskIdentity,
    Unknown(u8),
}

impl AlertDescription {
    pub fn from_u8(value: u8) -> Self {
        use AlertDescription::*;
        match value {
            0 => CloseNotify,
            10 => UnexpectedMessage,
            20 => BadRecordMac,
            21 => DecryptionFailed,
            22 => RecordOverflow,
            30 => DecompressionFailure,
            40 => HandshakeFailure,
            41 => NoCertificate,
            42 => BadCertificate,
            43 => UnsupportedCertificate,
            44 => CertificateRevoked,
            45 => CertificateExpired,
            46 => CertificateUnknown,
            47 => IllegalParameter,
            48 => UnknownCa,
            49 => AccessDenied,
            50 => DecodeError,
            51 => DecryptError,
            60 => ExportRestriction,
            70 => ProtocolVersion,
            71 => InsufficientSecurity,
            80 => InternalError,
            86 => InappropriateFallback,
            90 => UserCanceled,
            100 => NoRenegotiation,
            110 => UnsupportedExtension,
            115 => UnknownPskIdentity,
            _ => Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        use AlertDescription::*;
        match self {
            CloseNotify => 0,
            UnexpectedMessage => 10,
            BadRecordMac => 20,
            DecryptionFailed => 21,
            RecordOverflow => 22,
            DecompressionFailure => 30,
            HandshakeFailure => 40,
            NoCertificate => 41,
            BadCertificate => 42,
            UnsupportedCertificate => 43,
            CertificateRevoked => 44,
            CertificateExpired => 45,
            CertificateUnknown => 46,
            IllegalParameter => 47,
            UnknownCa => 48,
            AccessDenied => 49,
            DecodeError => 50,
            DecryptError => 51,
            ExportRestriction => 60,
            ProtocolVersion => 70,
            InsufficientSecurity => 71,
            InternalError => 80,
            InappropriateFallback => 86,
            UserCanceled => 90,
            NoRenegotiation => 100,
            UnsupportedExtension => 110,
            UnknownPskIdentity => 115,
            Unknown(v) => *v,
        }
    }
}

/// A two byte alert: level and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub const fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Alert { level, description }
    }

    pub const fn fatal(description: AlertDescription) -> Self {
        Alert::new(AlertLevel::Fatal, description)
    }

    pub const fn warning(description: AlertDescription) -> Self {
        Alert::new(AlertLevel::Warning, description)
    }

    pub const fn close_notify() -> Self {
        Alert::warning(AlertDescription::CloseNotify)
    }

    pub fn is_close_notify(&self) -> bool {
        self.description == AlertDescription::CloseNotify
    }

    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Alert> {
        let (input, level) = be_u8(input)?;
        let (input, description) = be_u8(input)?;
        Ok((
            input,
            Alert {
                level: AlertLevel::from_u8(level),
                description: AlertDescription::from_u8(description),
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.level.as_u8());
        output.push(self.description.as_u8());
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.level.as_u8(), self.description.as_u8()]
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.level, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_alert() {
        let (rest, alert) = Alert::parse(&[2, 20]).unwrap();
        assert!(rest.is_empty());
        assert!(alert.is_fatal());
        assert_eq!(alert.description, AlertDescription::BadRecordMac);
    }

    #[test]
    fn close_notify_bytes() {
        assert_eq!(Alert::close_notify().to_bytes(), [1, 0]);
    }

    #[test]
    fn parse_truncated() {
        assert!(Alert::parse(&[2]).is_err());
    }

    #[test]
    fn unknown_description_preserved() {
        let (_, alert) = Alert::parse(&[1, 201]).unwrap();
        assert_eq!(alert.description, AlertDescription::Unknown(201));
        assert_eq!(alert.to_bytes(), [1, 201]);
    }
}
