//! Hash implementations using RustCrypto.

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::buffer::Buf;
use crate::crypto::provider::{HashContext, HashProvider};
use crate::types::HashAlgorithm;

/// Hash context implementation using RustCrypto.
#[derive(Clone)]
enum RustCryptoHashContext {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl std::fmt::Debug for RustCryptoHashContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RustCryptoHashContext::Md5(_) => "Md5",
            RustCryptoHashContext::Sha1(_) => "Sha1",
            RustCryptoHashContext::Sha224(_) => "Sha224",
            RustCryptoHashContext::Sha256(_) => "Sha256",
            RustCryptoHashContext::Sha384(_) => "Sha384",
            RustCryptoHashContext::Sha512(_) => "Sha512",
        };
        f.debug_tuple("RustCryptoHashContext").field(&name).finish()
    }
}

fn finalize_into<D: Digest + Clone>(ctx: &D, out: &mut Buf) {
    let digest = ctx.clone().finalize();
    out.clear();
    out.extend_from_slice(&digest);
}

impl HashContext for RustCryptoHashContext {
    fn update(&mut self, data: &[u8]) {
        match self {
            RustCryptoHashContext::Md5(ctx) => ctx.update(data),
            RustCryptoHashContext::Sha1(ctx) => ctx.update(data),
            RustCryptoHashContext::Sha224(ctx) => ctx.update(data),
            RustCryptoHashContext::Sha256(ctx) => ctx.update(data),
            RustCryptoHashContext::Sha384(ctx) => ctx.update(data),
            RustCryptoHashContext::Sha512(ctx) => ctx.update(data),
        }
    }

    fn clone_and_finalize(&self, out: &mut Buf) {
        match self {
            RustCryptoHashContext::Md5(ctx) => finalize_into(ctx, out),
            RustCryptoHashContext::Sha1(ctx) => finalize_into(ctx, out),
            RustCryptoHashContext::Sha224(ctx) => finalize_into(ctx, out),
            RustCryptoHashContext::Sha256(ctx) => finalize_into(ctx, out),
            RustCryptoHashContext::Sha384(ctx) => finalize_into(ctx, out),
            RustCryptoHashContext::Sha512(ctx) => finalize_into(ctx, out),
        }
    }
}

/// Hash provider implementation.
#[derive(Debug)]
pub(super) struct RustCryptoHashProvider;

impl HashProvider for RustCryptoHashProvider {
    fn create_hash(&self, algorithm: HashAlgorithm) -> Box<dyn HashContext> {
        let ctx = match algorithm {
            HashAlgorithm::MD5 => RustCryptoHashContext::Md5(Md5::new()),
            HashAlgorithm::SHA1 => RustCryptoHashContext::Sha1(Sha1::new()),
            HashAlgorithm::SHA224 => RustCryptoHashContext::Sha224(Sha224::new()),
            HashAlgorithm::SHA256 => RustCryptoHashContext::Sha256(Sha256::new()),
            HashAlgorithm::SHA384 => RustCryptoHashContext::Sha384(Sha384::new()),
            HashAlgorithm::SHA512 => RustCryptoHashContext::Sha512(Sha512::new()),
        };
        Box::new(ctx)
    }
}

/// Static instance of the hash provider.
pub(super) static HASH_PROVIDER: RustCryptoHashProvider = RustCryptoHashProvider;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lengths_match_algorithm() {
        for alg in HashAlgorithm::ALL {
            let mut ctx = HASH_PROVIDER.create_hash(*alg);
            ctx.update(b"abc");
            let mut out = Buf::new();
            ctx.clone_and_finalize(&mut out);
            assert_eq!(out.len(), alg.output_len(), "{:?}", alg);
        }
    }

    #[test]
    fn context_continues_after_finalize() {
        let mut ctx = HASH_PROVIDER.create_hash(HashAlgorithm::SHA256);
        ctx.update(b"ab");
        let mut partial = Buf::new();
        ctx.clone_and_finalize(&mut partial);
        ctx.update(b"c");
        let mut full = Buf::new();
        ctx.clone_and_finalize(&mut full);

        let expected = Sha256::digest(b"abc");
        assert_eq!(&full[..], &expected[..]);
        assert_ne!(&partial[..], &full[..]);
    }
}
