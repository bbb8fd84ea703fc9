use std::io;

use thiserror::Error;

use crate::alert::{Alert, AlertDescription};
use crate::types::ProtocolVersion;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Record length {0} exceeds the maximum allowed")]
    RecordOverflow(usize),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Unexpected protocol version {0}")]
    ProtocolVersion(ProtocolVersion),

    #[error("Record MAC or padding check failed")]
    BadRecordMac,

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("Received alert from peer: {0}")]
    RemoteAlert(Alert),

    #[error("Connection closed abruptly by peer")]
    AbruptClose,

    #[error("Transport error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection is closed")]
    ClosedConnection,

    #[error("Unsupported cipher suite 0x{0:04x}")]
    UnsupportedCipherSuite(u16),

    #[error("No pending cipher state to activate")]
    NoPendingState,

    #[error("Crypto error: {0}")]
    CryptoError(String),
}

impl Error {
    /// The alert this error is reported to the peer with, if any.
    ///
    /// Transport failures, peer-initiated closes and caller mistakes are
    /// never answered.
    pub fn alert(&self) -> Option<AlertDescription> {
        let desc = match self {
            Error::RecordOverflow(_) => AlertDescription::RecordOverflow,
            Error::DecodeError(_) => AlertDescription::DecodeError,
            Error::ProtocolVersion(_) => AlertDescription::ProtocolVersion,
            Error::BadRecordMac => AlertDescription::BadRecordMac,
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::CryptoError(_) => AlertDescription::InternalError,
            Error::UnsupportedCipherSuite(_)
            | Error::NoPendingState
            | Error::RemoteAlert(_)
            | Error::AbruptClose
            | Error::Io(_)
            | Error::ClosedConnection => return None,
        };
        Some(desc)
    }

    /// True for transport level failures that tear the connection down
    /// without sending anything.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io(_) | Error::AbruptClose)
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(value: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        Error::DecodeError(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_for_local_errors() {
        assert_eq!(
            Error::RecordOverflow(20000).alert(),
            Some(AlertDescription::RecordOverflow)
        );
        assert_eq!(Error::BadRecordMac.alert(), Some(AlertDescription::BadRecordMac));
        assert_eq!(
            Error::DecodeError("x".into()).alert(),
            Some(AlertDescription::DecodeError)
        );
        assert_eq!(
            Error::CryptoError("x".into()).alert(),
            Some(AlertDescription::InternalError)
        );
    }

    #[test]
    fn no_alert_for_transport_errors() {
        assert!(Error::AbruptClose.alert().is_none());
        assert!(Error::ClosedConnection.alert().is_none());
        let io = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(Error::from(io).alert().is_none());
    }
}
