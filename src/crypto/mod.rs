//! Cryptographic primitives and helpers used by the record layer.

use std::ops::Deref;

mod aead;
mod keys;
pub mod provider;
pub mod rust_crypto;
mod transcript;

pub use keys::KeyBlock;
pub use transcript::HandshakeHashes;

// Re-export AEAD types needed for Cipher trait implementations (public API)
pub use aead::{Aad, Nonce};

pub(crate) use aead::{Iv, AEAD_OVERHEAD, EXPLICIT_NONCE_LEN};

pub use provider::{BlockCipher, Cipher, CryptoProvider, CryptoSafe, HashContext, HashProvider};
pub use provider::{MacProvider, PrfProvider, RecordCipher, RecordMac, SupportedCipherSuite};

pub use crate::buffer::{Buf, TmpBuf};
pub use crate::types::{CipherSuite, HashAlgorithm, MacAlgorithm};

impl Deref for Aad {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for Nonce {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
