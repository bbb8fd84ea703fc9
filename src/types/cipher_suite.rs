use nom::number::complete::be_u16;
use nom::IResult;

use super::{HashAlgorithm, ProtocolVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
/// Cipher suites the record layer can derive keys for and protect records with.
///
/// The key exchange half of the suite name is irrelevant here. Suites that
/// only differ in key exchange share the same record protection.
pub enum CipherSuite {
    RSA_WITH_NULL_SHA,              // 0x0002
    RSA_WITH_NULL_SHA256,           // 0x003B
    RSA_WITH_AES_128_CBC_SHA,       // 0x002F
    RSA_WITH_AES_256_CBC_SHA,       // 0x0035
    DHE_RSA_WITH_AES_128_CBC_SHA,   // 0x0033
    DHE_RSA_WITH_AES_256_CBC_SHA,   // 0x0039
    ECDHE_RSA_WITH_AES_128_CBC_SHA, // 0xC013
    ECDHE_RSA_WITH_AES_256_CBC_SHA, // 0xC014
    RSA_WITH_AES_128_CBC_SHA256,    // 0x003C
    RSA_WITH_AES_256_CBC_SHA256,    // 0x003D
    RSA_WITH_AES_128_GCM_SHA256,    // 0x009C
    RSA_WITH_AES_256_GCM_SHA384,    // 0x009D
    ECDHE_RSA_WITH_AES_128_GCM_SHA256, // 0xC02F
    ECDHE_RSA_WITH_AES_256_GCM_SHA384, // 0xC030

    /// Unknown or unsupported cipher suite by its IANA value
    Unknown(u16),
}

/// Bulk encryption applied to a record after (or instead of) the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCipher {
    Null,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
}

/// MAC applied before encryption. AEAD suites carry no separate MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    None,
    HmacSha1,
    HmacSha256,
}

impl CipherSuite {
    /// Convert the 16-bit IANA value to a `CipherSuite`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0002 => CipherSuite::RSA_WITH_NULL_SHA,
            0x003B => CipherSuite::RSA_WITH_NULL_SHA256,
            0x002F => CipherSuite::RSA_WITH_AES_128_CBC_SHA,
            0x0035 => CipherSuite::RSA_WITH_AES_256_CBC_SHA,
            0x0033 => CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA,
            0x0039 => CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA,
            0xC013 => CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA,
            0xC014 => CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA,
            0x003C => CipherSuite::RSA_WITH_AES_128_CBC_SHA256,
            0x003D => CipherSuite::RSA_WITH_AES_256_CBC_SHA256,
            0x009C => CipherSuite::RSA_WITH_AES_128_GCM_SHA256,
            0x009D => CipherSuite::RSA_WITH_AES_256_GCM_SHA384,
            0xC02F => CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            0xC030 => CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            _ => CipherSuite::Unknown(value),
        }
    }

    /// Return the 16-bit IANA value for this cipher suite.
    pub fn as_u16(&self) -> u16 {
        match self {
            CipherSuite::RSA_WITH_NULL_SHA => 0x0002,
            CipherSuite::RSA_WITH_NULL_SHA256 => 0x003B,
            CipherSuite::RSA_WITH_AES_128_CBC_SHA => 0x002F,
            CipherSuite::RSA_WITH_AES_256_CBC_SHA => 0x0035,
            CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA => 0x0033,
            CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA => 0x0039,
            CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA => 0xC013,
            CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA => 0xC014,
            CipherSuite::RSA_WITH_AES_128_CBC_SHA256 => 0x003C,
            CipherSuite::RSA_WITH_AES_256_CBC_SHA256 => 0x003D,
            CipherSuite::RSA_WITH_AES_128_GCM_SHA256 => 0x009C,
            CipherSuite::RSA_WITH_AES_256_GCM_SHA384 => 0x009D,
            CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256 => 0xC02F,
            CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384 => 0xC030,
            CipherSuite::Unknown(value) => *value,
        }
    }

    /// Parse a `CipherSuite` from network byte order.
    pub fn parse(input: &[u8]) -> IResult<&[u8], CipherSuite> {
        let (input, value) = be_u16(input)?;
        Ok((input, CipherSuite::from_u16(value)))
    }

    pub fn bulk_cipher(&self) -> Option<BulkCipher> {
        use CipherSuite::*;
        let bulk = match self {
            RSA_WITH_NULL_SHA | RSA_WITH_NULL_SHA256 => BulkCipher::Null,
            RSA_WITH_AES_128_CBC_SHA
            | DHE_RSA_WITH_AES_128_CBC_SHA
            | ECDHE_RSA_WITH_AES_128_CBC_SHA
            | RSA_WITH_AES_128_CBC_SHA256 => BulkCipher::Aes128Cbc,
            RSA_WITH_AES_256_CBC_SHA
            | DHE_RSA_WITH_AES_256_CBC_SHA
            | ECDHE_RSA_WITH_AES_256_CBC_SHA
            | RSA_WITH_AES_256_CBC_SHA256 => BulkCipher::Aes256Cbc,
            RSA_WITH_AES_128_GCM_SHA256 | ECDHE_RSA_WITH_AES_128_GCM_SHA256 => {
                BulkCipher::Aes128Gcm
            }
            RSA_WITH_AES_256_GCM_SHA384 | ECDHE_RSA_WITH_AES_256_GCM_SHA384 => {
                BulkCipher::Aes256Gcm
            }
            Unknown(_) => return None,
        };
        Some(bulk)
    }

    pub fn mac_algorithm(&self) -> Option<MacAlgorithm> {
        use CipherSuite::*;
        let mac = match self {
            RSA_WITH_NULL_SHA
            | RSA_WITH_AES_128_CBC_SHA
            | RSA_WITH_AES_256_CBC_SHA
            | DHE_RSA_WITH_AES_128_CBC_SHA
            | DHE_RSA_WITH_AES_256_CBC_SHA
            | ECDHE_RSA_WITH_AES_128_CBC_SHA
            | ECDHE_RSA_WITH_AES_256_CBC_SHA => MacAlgorithm::HmacSha1,
            RSA_WITH_NULL_SHA256 | RSA_WITH_AES_128_CBC_SHA256 | RSA_WITH_AES_256_CBC_SHA256 => {
                MacAlgorithm::HmacSha256
            }
            RSA_WITH_AES_128_GCM_SHA256
            | RSA_WITH_AES_256_GCM_SHA384
            | ECDHE_RSA_WITH_AES_128_GCM_SHA256
            | ECDHE_RSA_WITH_AES_256_GCM_SHA384 => MacAlgorithm::None,
            Unknown(_) => return None,
        };
        Some(mac)
    }

    /// Hash driving the TLS 1.2 PRF for this suite.
    ///
    /// Earlier versions ignore this and use their fixed PRF construction.
    pub fn prf_hash(&self) -> HashAlgorithm {
        match self {
            CipherSuite::RSA_WITH_AES_256_GCM_SHA384
            | CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384 => HashAlgorithm::SHA384,
            _ => HashAlgorithm::SHA256,
        }
    }

    /// Oldest protocol version the suite may be negotiated at.
    pub fn min_version(&self) -> ProtocolVersion {
        match self.mac_algorithm() {
            Some(MacAlgorithm::HmacSha1) => ProtocolVersion::SSL3_0,
            _ => ProtocolVersion::TLS1_2,
        }
    }

    /// Returns true if this cipher suite is supported by this implementation.
    pub fn is_supported(&self) -> bool {
        !matches!(self, CipherSuite::Unknown(_))
    }

    /// All supported cipher suites, strongest first.
    pub const fn all() -> &'static [CipherSuite; 14] {
        &[
            CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::RSA_WITH_AES_256_GCM_SHA384,
            CipherSuite::RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::RSA_WITH_AES_256_CBC_SHA256,
            CipherSuite::RSA_WITH_AES_128_CBC_SHA256,
            CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA,
            CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA,
            CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA,
            CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA,
            CipherSuite::RSA_WITH_AES_256_CBC_SHA,
            CipherSuite::RSA_WITH_AES_128_CBC_SHA,
            CipherSuite::RSA_WITH_NULL_SHA256,
            CipherSuite::RSA_WITH_NULL_SHA,
        ]
    }
}

impl BulkCipher {
    /// Encryption key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            BulkCipher::Null => 0,
            BulkCipher::Aes128Cbc | BulkCipher::Aes128Gcm => 16,
            BulkCipher::Aes256Cbc | BulkCipher::Aes256Gcm => 32,
        }
    }

    /// IV bytes taken from the key block.
    ///
    /// CBC takes a full block, used as the initial chain value for SSL 3.0
    /// and TLS 1.0. GCM takes the 4 byte implicit nonce prefix.
    pub fn fixed_iv_len(&self) -> usize {
        match self {
            BulkCipher::Null => 0,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => 4,
        }
    }

    pub fn block_len(&self) -> usize {
        match self {
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => 16,
            _ => 1,
        }
    }

    pub fn is_cbc(&self) -> bool {
        matches!(self, BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc)
    }

    pub fn is_aead(&self) -> bool {
        matches!(self, BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm)
    }

    /// Short cipher name, `None` for the null cipher.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            BulkCipher::Null => None,
            BulkCipher::Aes128Cbc | BulkCipher::Aes128Gcm => Some("aes128"),
            BulkCipher::Aes256Cbc | BulkCipher::Aes256Gcm => Some("aes256"),
        }
    }
}

impl MacAlgorithm {
    pub fn output_len(&self) -> usize {
        match self {
            MacAlgorithm::None => 0,
            MacAlgorithm::HmacSha1 => 20,
            MacAlgorithm::HmacSha256 => 32,
        }
    }

    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        match self {
            MacAlgorithm::None => None,
            MacAlgorithm::HmacSha1 => Some(HashAlgorithm::SHA1),
            MacAlgorithm::HmacSha256 => Some(HashAlgorithm::SHA256),
        }
    }
}
