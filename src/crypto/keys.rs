//! Key block expansion (RFC 5246 §6.3, RFC 6101 §6.2.2).

use zeroize::Zeroize;

use crate::buffer::Buf;
use crate::crypto::provider::{CryptoProvider, SupportedCipherSuite};
use crate::types::ProtocolVersion;
use crate::Error;

/// Expanded key material for both directions.
///
/// Layout: client MAC, server MAC, client key, server key, client IV,
/// server IV. Wiped on drop.
pub struct KeyBlock {
    block: Buf,
    mac_len: usize,
    key_len: usize,
    iv_len: usize,
}

impl KeyBlock {
    /// Derive the key block for `suite` at `version`.
    pub fn derive(
        provider: &CryptoProvider,
        suite: &dyn SupportedCipherSuite,
        version: ProtocolVersion,
        master_secret: &[u8],
        client_random: &[u8],
        server_random: &[u8],
    ) -> Result<KeyBlock, Error> {
        let (mac_len, key_len, iv_len) = suite.key_lengths();
        let total = 2 * (mac_len + key_len + iv_len);

        let mut seed = Buf::new();
        seed.extend_from_slice(server_random);
        seed.extend_from_slice(client_random);

        let prf = provider.prf_provider;
        let mut block = Buf::new();
        let mut scratch = Buf::new();

        let res = if version <= ProtocolVersion::SSL3_0 {
            prf.ssl3_key_block(master_secret, &seed, &mut block, total)
        } else if version < ProtocolVersion::TLS1_2 {
            prf.prf_tls10(
                master_secret,
                "key expansion",
                &seed,
                &mut block,
                total,
                &mut scratch,
            )
        } else {
            prf.prf_tls12(
                master_secret,
                "key expansion",
                &seed,
                &mut block,
                total,
                &mut scratch,
                suite.hash_algorithm(),
            )
        };
        scratch.zeroize();
        res.map_err(Error::CryptoError)?;

        Ok(KeyBlock {
            block,
            mac_len,
            key_len,
            iv_len,
        })
    }

    fn slice(&self, start: usize, len: usize) -> &[u8] {
        &self.block[start..start + len]
    }

    pub fn client_mac(&self) -> &[u8] {
        self.slice(0, self.mac_len)
    }

    pub fn server_mac(&self) -> &[u8] {
        self.slice(self.mac_len, self.mac_len)
    }

    pub fn client_key(&self) -> &[u8] {
        self.slice(2 * self.mac_len, self.key_len)
    }

    pub fn server_key(&self) -> &[u8] {
        self.slice(2 * self.mac_len + self.key_len, self.key_len)
    }

    pub fn client_iv(&self) -> &[u8] {
        self.slice(2 * (self.mac_len + self.key_len), self.iv_len)
    }

    pub fn server_iv(&self) -> &[u8] {
        self.slice(2 * (self.mac_len + self.key_len) + self.iv_len, self.iv_len)
    }
}

impl Drop for KeyBlock {
    fn drop(&mut self) {
        self.block.zeroize();
    }
}

impl std::fmt::Debug for KeyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBlock")
            .field("mac_len", &self.mac_len)
            .field("key_len", &self.key_len)
            .field("iv_len", &self.iv_len)
            .finish()
    }
}
