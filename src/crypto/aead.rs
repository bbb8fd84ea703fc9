//! AEAD record formatting types and constants (RFC 5288).

use tinyvec::ArrayVec;

use crate::types::{ContentType, ProtocolVersion};

/// Explicit nonce length for AES-GCM records.
///
/// The explicit nonce is transmitted with each record.
pub(crate) const EXPLICIT_NONCE_LEN: usize = 8;

/// GCM authentication tag length.
pub(crate) const GCM_TAG_LEN: usize = 16;

/// Overhead per AEAD record (explicit nonce + tag).
pub(crate) const AEAD_OVERHEAD: usize = EXPLICIT_NONCE_LEN + GCM_TAG_LEN;

/// Fixed IV portion from the key block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Iv(pub [u8; 4]);

impl Iv {
    pub(crate) fn new(iv: &[u8]) -> Option<Self> {
        iv.try_into().ok().map(Self)
    }
}

/// Full AEAD nonce (fixed IV + explicit nonce).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce(pub [u8; 12]);

impl Nonce {
    pub(crate) fn new(iv: Iv, explicit_nonce: &[u8; EXPLICIT_NONCE_LEN]) -> Self {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&iv.0);
        nonce[4..].copy_from_slice(explicit_nonce);
        Self(nonce)
    }
}

/// Additional Authenticated Data: seq(8) ‖ type(1) ‖ version(2) ‖ length(2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aad(pub ArrayVec<[u8; 13]>);

impl Aad {
    pub(crate) fn new(
        content_type: ContentType,
        seq: u64,
        version: ProtocolVersion,
        length: u16,
    ) -> Self {
        let mut aad = ArrayVec::new();
        aad.extend_from_slice(&seq.to_be_bytes());
        aad.push(content_type.as_u8());
        aad.extend_from_slice(&version.to_bytes());
        aad.extend_from_slice(&length.to_be_bytes());
        Aad(aad)
    }
}
