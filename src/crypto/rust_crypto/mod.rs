//! RustCrypto cryptographic provider implementation.
//!
//! A pure Rust backend using crates from the
//! [RustCrypto](https://github.com/RustCrypto) organization. This is the
//! provider [`Config::builder()`](crate::Config::builder) falls back to when
//! none is set and no process default was installed.
//!
//! ```
//! use std::sync::Arc;
//! use tlsrecord::Config;
//! use tlsrecord::crypto::rust_crypto;
//!
//! let config = Arc::new(
//!     Config::builder()
//!         .with_crypto_provider(rust_crypto::default_provider())
//!         .build(),
//! );
//! assert_eq!(config.crypto_provider().name, "rust-crypto");
//! ```

mod cipher_suite;
mod hash;
mod hmac;
mod prf;

use crate::crypto::provider::CryptoProvider;

/// Get the default RustCrypto-based crypto provider.
///
/// # Supported Cipher Suites
///
/// - NULL with HMAC-SHA1 and HMAC-SHA256
/// - AES-128-CBC and AES-256-CBC with HMAC-SHA1 (SSL 3.0 and up)
/// - AES-128-CBC and AES-256-CBC with HMAC-SHA256 (TLS 1.2)
/// - AES-128-GCM and AES-256-GCM (TLS 1.2)
///
/// # Key Derivation
///
/// - SSL 3.0 MD5/SHA-1 key block construction
/// - TLS 1.0/1.1 PRF (P_MD5 XOR P_SHA1)
/// - TLS 1.2 PRF with SHA-256 or SHA-384
pub fn default_provider() -> CryptoProvider {
    CryptoProvider {
        name: "rust-crypto",
        cipher_suites: cipher_suite::ALL_CIPHER_SUITES,
        mac_provider: &hmac::MAC_PROVIDER,
        prf_provider: &prf::PRF_PROVIDER,
        hash_provider: &hash::HASH_PROVIDER,
    }
}
