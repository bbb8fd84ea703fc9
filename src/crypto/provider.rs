//! Cryptographic provider traits for pluggable crypto backends.
//!
//! The [`CryptoProvider`] struct holds static references to trait objects,
//! one per capability the record layer needs:
//!
//! - **Cipher Suites** ([`SupportedCipherSuite`]): factory for record ciphers
//! - **MAC Provider** ([`MacProvider`]): factory for record MACs
//! - **PRF Provider** ([`PrfProvider`]): key block expansion for every version
//! - **Hash Provider** ([`HashProvider`]): factory for transcript hash contexts
//!
//! A provider is picked once per process with [`CryptoProvider::install_default`],
//! or per connection through [`Config`](crate::Config). The provider's
//! [`name`](CryptoProvider::name) is what
//! [`RecordLayer::cipher_implementation`](crate::RecordLayer::cipher_implementation)
//! reports.
//!
//! # Thread Safety
//!
//! All provider traits require `Send + Sync + UnwindSafe + RefUnwindSafe`.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

use once_cell::sync::OnceCell;

use crate::buffer::{Buf, TmpBuf};
use crate::crypto::{Aad, Nonce};
use crate::types::{CipherSuite, HashAlgorithm, MacAlgorithm};

/// Marker trait for types that are safe to use in crypto provider components.
///
/// This trait is automatically implemented for all types that satisfy the bounds.
pub trait CryptoSafe: Send + Sync + Debug + UnwindSafe + RefUnwindSafe {}

impl<T: Send + Sync + Debug + UnwindSafe + RefUnwindSafe> CryptoSafe for T {}

// ============================================================================
// Instance Traits (created by factories)
// ============================================================================

/// AEAD cipher for in-place encryption/decryption.
pub trait Cipher: CryptoSafe {
    /// Encrypt plaintext in-place, appending the authentication tag.
    fn encrypt(&mut self, plaintext: &mut Buf, aad: Aad, nonce: Nonce) -> Result<(), String>;

    /// Decrypt ciphertext in-place, verifying and removing the authentication tag.
    fn decrypt(&mut self, ciphertext: &mut TmpBuf, aad: Aad, nonce: Nonce) -> Result<(), String>;
}

/// Raw CBC block cipher. Padding and IV handling belong to the caller.
pub trait BlockCipher: CryptoSafe {
    /// Block size in bytes.
    fn block_len(&self) -> usize;

    /// Encrypt `data` in CBC mode starting from `iv`.
    ///
    /// `data.len()` must be a multiple of [`block_len`](Self::block_len).
    fn encrypt_cbc(&mut self, iv: &[u8], data: &mut [u8]) -> Result<(), String>;

    /// Decrypt `data` in CBC mode starting from `iv`.
    fn decrypt_cbc(&mut self, iv: &[u8], data: &mut [u8]) -> Result<(), String>;
}

/// Record MAC context keyed with one direction's MAC secret.
pub trait RecordMac: CryptoSafe {
    /// MAC length in bytes.
    fn output_len(&self) -> usize;

    /// Feed data into the MAC.
    fn update(&mut self, data: &[u8]);

    /// Write the MAC to `out` and reset for the next record.
    fn finalize_reset(&mut self, out: &mut Buf);
}

/// Stateful hash context for incremental hashing.
pub trait HashContext: CryptoSafe {
    /// Update the hash with new data.
    fn update(&mut self, data: &[u8]);

    /// Clone the context and finalize it, writing the hash to `out`.
    /// The original context can continue to be updated.
    fn clone_and_finalize(&self, out: &mut Buf);
}

/// Bulk cipher instance created for one direction.
#[derive(Debug)]
pub enum RecordCipher {
    /// No encryption, MAC only.
    Null,
    /// CBC block cipher, MAC-then-encrypt.
    Cbc(Box<dyn BlockCipher>),
    /// AEAD cipher.
    Aead(Box<dyn Cipher>),
}

// ============================================================================
// Factory Traits (used by CryptoProvider)
// ============================================================================

/// Cipher suite support (factory for [`RecordCipher`] instances).
pub trait SupportedCipherSuite: CryptoSafe {
    /// The cipher suite this supports.
    fn suite(&self) -> CipherSuite;

    /// Hash algorithm driving the TLS 1.2 PRF for this suite.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// Key material lengths: (mac_key_len, enc_key_len, fixed_iv_len).
    fn key_lengths(&self) -> (usize, usize, usize);

    /// Create a cipher instance with the given key.
    fn create_cipher(&self, key: &[u8]) -> Result<RecordCipher, String>;
}

/// MAC provider (factory for [`RecordMac`]).
pub trait MacProvider: CryptoSafe {
    /// Create a MAC for the given algorithm.
    ///
    /// When `ssl3` is true the SSL 3.0 pad1/pad2 construction is used instead
    /// of HMAC.
    fn create_mac(
        &self,
        algorithm: MacAlgorithm,
        ssl3: bool,
        key: &[u8],
    ) -> Result<Box<dyn RecordMac>, String>;
}

/// Hash provider (factory for [`HashContext`]).
pub trait HashProvider: CryptoSafe {
    /// Create a new hash context for the specified algorithm.
    fn create_hash(&self, algorithm: HashAlgorithm) -> Box<dyn HashContext>;
}

/// PRF (Pseudo-Random Function) implementations for key derivation.
pub trait PrfProvider: CryptoSafe {
    /// TLS 1.2 PRF: P_hash(secret, label + seed) writing `output_len` bytes to `out`.
    /// Uses `scratch` for temporary concatenation of label+seed.
    #[allow(clippy::too_many_arguments)]
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
        scratch: &mut Buf,
        hash: HashAlgorithm,
    ) -> Result<(), String>;

    /// TLS 1.0/1.1 PRF: P_MD5(S1, label + seed) XOR P_SHA1(S2, label + seed).
    fn prf_tls10(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
        scratch: &mut Buf,
    ) -> Result<(), String>;

    /// SSL 3.0 key block: MD5(secret + SHA1('A' + secret + seed)) + ...
    fn ssl3_key_block(
        &self,
        secret: &[u8],
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
    ) -> Result<(), String>;
}

// ============================================================================
// Core Provider Struct
// ============================================================================

/// Cryptographic provider for the record layer.
#[derive(Debug, Clone)]
pub struct CryptoProvider {
    /// Diagnostic name of the implementation.
    pub name: &'static str,

    /// Supported cipher suites.
    pub cipher_suites: &'static [&'static dyn SupportedCipherSuite],

    /// Record MACs (HMAC and the SSL 3.0 MAC).
    pub mac_provider: &'static dyn MacProvider,

    /// Key block expansion.
    pub prf_provider: &'static dyn PrfProvider,

    /// Hash contexts for the handshake transcript.
    pub hash_provider: &'static dyn HashProvider,
}

/// Static storage for the default crypto provider.
///
/// This is set by `install_default()` and retrieved by `get_default()`.
static DEFAULT: OnceCell<CryptoProvider> = OnceCell::new();

impl CryptoProvider {
    /// Install a default crypto provider for the process.
    ///
    /// Used by [`Config::builder()`](crate::Config::builder) when no explicit
    /// provider is specified.
    ///
    /// Returns the provider back if a default was already installed.
    pub fn install_default(provider: CryptoProvider) -> Result<(), CryptoProvider> {
        DEFAULT.set(provider)
    }

    /// Get the default crypto provider, if one has been installed.
    pub fn get_default() -> Option<&'static CryptoProvider> {
        DEFAULT.get()
    }

    /// Look up a cipher suite by its IANA id.
    pub fn find_suite(&self, id: u16) -> Option<&'static dyn SupportedCipherSuite> {
        self.cipher_suites
            .iter()
            .copied()
            .find(|s| s.suite().as_u16() == id)
    }
}
