use std::fmt;

use crate::buffer::Buf;
use crate::crypto::provider::{CryptoProvider, HashContext};
use crate::types::{HashAlgorithm, ProtocolVersion};

/// Running hashes over every handshake message sent and received.
///
/// All algorithms run in parallel since the one needed for Finished and
/// CertificateVerify is only known once the handshake has progressed.
pub struct HandshakeHashes {
    contexts: Vec<(HashAlgorithm, Box<dyn HashContext>)>,
}

impl HandshakeHashes {
    pub fn new(provider: &CryptoProvider) -> Self {
        let contexts = HashAlgorithm::ALL
            .iter()
            .map(|alg| (*alg, provider.hash_provider.create_hash(*alg)))
            .collect();
        HandshakeHashes { contexts }
    }

    pub fn update(&mut self, data: &[u8]) {
        for (_, ctx) in &mut self.contexts {
            ctx.update(data);
        }
    }

    /// Digest of the transcript so far with one algorithm.
    pub fn digest_for(&self, algorithm: HashAlgorithm) -> Buf {
        let mut out = Buf::new();
        if let Some((_, ctx)) = self.contexts.iter().find(|(a, _)| *a == algorithm) {
            ctx.clone_and_finalize(&mut out);
        }
        out
    }

    /// Transcript digest as used by `version`'s Finished computation.
    ///
    /// MD5 ‖ SHA-1 before TLS 1.2, SHA-256 from TLS 1.2.
    pub fn digest(&self, version: ProtocolVersion) -> Buf {
        if version >= ProtocolVersion::TLS1_2 {
            return self.digest_for(HashAlgorithm::SHA256);
        }
        let mut out = self.digest_for(HashAlgorithm::MD5);
        out.extend_from_slice(&self.digest_for(HashAlgorithm::SHA1));
        out
    }
}

impl fmt::Debug for HandshakeHashes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeHashes")
            .field("algorithms", &self.contexts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::rust_crypto;

    #[test]
    fn digest_lengths_per_version() {
        let mut hashes = HandshakeHashes::new(&rust_crypto::default_provider());
        hashes.update(b"client hello");
        assert_eq!(hashes.digest(ProtocolVersion::TLS1_0).len(), 36);
        assert_eq!(hashes.digest(ProtocolVersion::SSL3_0).len(), 36);
        assert_eq!(hashes.digest(ProtocolVersion::TLS1_2).len(), 32);
        assert_eq!(hashes.digest_for(HashAlgorithm::SHA512).len(), 64);
    }

    #[test]
    fn split_updates_equal_single_update() {
        let provider = rust_crypto::default_provider();
        let mut a = HandshakeHashes::new(&provider);
        let mut b = HandshakeHashes::new(&provider);
        a.update(b"hello world");
        b.update(b"hello ");
        b.update(b"world");
        assert_eq!(
            &a.digest_for(HashAlgorithm::SHA384)[..],
            &b.digest_for(HashAlgorithm::SHA384)[..]
        );
    }
}
