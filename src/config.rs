use crate::crypto::rust_crypto;
use crate::crypto::CryptoProvider;
use crate::record::MAX_PLAINTEXT_LEN;

/// Smallest fragment size the record layer will produce.
const MIN_FRAGMENT_LEN: usize = 64;

/// Record layer configuration
#[derive(Debug, Clone)]
pub struct Config {
    max_fragment_len: usize,
    max_handshake_len: usize,
    version_check: bool,
    split_first_record: bool,
    rng_seed: Option<u64>,
    crypto_provider: CryptoProvider,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            max_fragment_len: MAX_PLAINTEXT_LEN,
            max_handshake_len: 128 * 1024,
            version_check: false,
            split_first_record: true,
            rng_seed: None,
            crypto_provider: None,
        }
    }

    /// Largest plaintext fragment put in one outgoing record.
    #[inline(always)]
    pub fn max_fragment_len(&self) -> usize {
        self.max_fragment_len
    }

    /// Largest handshake message body accepted from the peer.
    #[inline(always)]
    pub fn max_handshake_len(&self) -> usize {
        self.max_handshake_len
    }

    /// Whether incoming records must carry the negotiated version.
    #[inline(always)]
    pub fn version_check(&self) -> bool {
        self.version_check
    }

    /// Whether application data is split 1/n-1 on CBC suites before TLS 1.1.
    #[inline(always)]
    pub fn split_first_record(&self) -> bool {
        self.split_first_record
    }

    /// Seed for explicit IV generation, `None` for the thread RNG.
    #[inline(always)]
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// Cryptographic provider.
    ///
    /// Provides ciphers, MACs, key derivation and transcript hashes.
    #[inline(always)]
    pub fn crypto_provider(&self) -> &CryptoProvider {
        &self.crypto_provider
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

/// Builder for record layer configuration.
pub struct ConfigBuilder {
    max_fragment_len: usize,
    max_handshake_len: usize,
    version_check: bool,
    split_first_record: bool,
    rng_seed: Option<u64>,
    crypto_provider: Option<CryptoProvider>,
}

impl ConfigBuilder {
    /// Set the largest plaintext fragment per outgoing record.
    ///
    /// Clamped to 64..=16384.
    /// Defaults to 16384.
    pub fn max_fragment_len(mut self, len: usize) -> Self {
        self.max_fragment_len = len.clamp(MIN_FRAGMENT_LEN, MAX_PLAINTEXT_LEN);
        self
    }

    /// Set the largest handshake message body accepted from the peer.
    ///
    /// A larger declared length fails with `decode_error` before any of the
    /// body is buffered.
    /// Defaults to 131072.
    pub fn max_handshake_len(mut self, len: usize) -> Self {
        self.max_handshake_len = len;
        self
    }

    /// Require incoming standard records to carry the negotiated version.
    ///
    /// Defaults to false.
    pub fn version_check(mut self, check: bool) -> Self {
        self.version_check = check;
        self
    }

    /// Split application data 1/n-1 on CBC suites at TLS 1.0 and earlier.
    ///
    /// Defaults to true.
    pub fn split_first_record(mut self, split: bool) -> Self {
        self.split_first_record = split;
        self
    }

    /// Seed the IV generator for reproducible output.
    ///
    /// Defaults to unseeded.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Set a custom crypto provider.
    ///
    /// If not set, the process default from
    /// [`CryptoProvider::install_default`] is used, then the rust-crypto
    /// provider.
    pub fn with_crypto_provider(mut self, provider: CryptoProvider) -> Self {
        self.crypto_provider = Some(provider);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        let crypto_provider = self
            .crypto_provider
            .or_else(|| CryptoProvider::get_default().cloned())
            .unwrap_or_else(rust_crypto::default_provider);

        Config {
            max_fragment_len: self.max_fragment_len,
            max_handshake_len: self.max_handshake_len,
            version_check: self.version_check,
            split_first_record: self.split_first_record,
            rng_seed: self.rng_seed,
            crypto_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.max_fragment_len(), 16384);
        assert_eq!(config.max_handshake_len(), 131072);
        assert!(!config.version_check());
        assert!(config.split_first_record());
        assert!(config.rng_seed().is_none());
    }

    #[test]
    fn fragment_len_is_clamped() {
        let small = Config::builder().max_fragment_len(1).build();
        assert_eq!(small.max_fragment_len(), 64);
        let big = Config::builder().max_fragment_len(1 << 20).build();
        assert_eq!(big.max_fragment_len(), 16384);
    }
}
