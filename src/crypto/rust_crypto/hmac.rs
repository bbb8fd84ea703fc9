//! HMAC, the SSL 3.0 MAC and P_hash using RustCrypto.

use std::fmt;

use ::hmac::digest::KeyInit;
use ::hmac::{Hmac, Mac};
use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::buffer::Buf;
use crate::crypto::provider::{MacProvider, RecordMac};
use crate::types::{HashAlgorithm, MacAlgorithm};

/// P_hash(secret, seed) from RFC 2246 §5 / RFC 5246 §5.
///
/// A(0) = seed, A(i) = HMAC(secret, A(i-1)),
/// output = HMAC(secret, A(1) + seed) + HMAC(secret, A(2) + seed) + ...
fn p_hash_with<M>(secret: &[u8], seed: &[u8], out: &mut Buf, output_len: usize) -> Result<(), String>
where
    M: Mac + KeyInit + Clone,
{
    let keyed = <M as KeyInit>::new_from_slice(secret)
        .map_err(|_| "Invalid HMAC key length".to_string())?;

    out.clear();

    let mut a_mac = keyed.clone();
    a_mac.update(seed);
    let mut a = a_mac.finalize().into_bytes();

    while out.len() < output_len {
        let mut ctx = keyed.clone();
        ctx.update(&a);
        ctx.update(seed);
        let output = ctx.finalize().into_bytes();

        let remaining = output_len - out.len();
        let to_copy = remaining.min(output.len());
        out.extend_from_slice(&output[..to_copy]);

        if out.len() < output_len {
            let mut next_a = keyed.clone();
            next_a.update(&a);
            a = next_a.finalize().into_bytes();
        }
    }

    Ok(())
}

pub(super) fn p_hash(
    hash_alg: HashAlgorithm,
    secret: &[u8],
    full_seed: &[u8],
    out: &mut Buf,
    output_len: usize,
) -> Result<(), String> {
    match hash_alg {
        HashAlgorithm::MD5 => p_hash_with::<Hmac<Md5>>(secret, full_seed, out, output_len),
        HashAlgorithm::SHA1 => p_hash_with::<Hmac<Sha1>>(secret, full_seed, out, output_len),
        HashAlgorithm::SHA224 => p_hash_with::<Hmac<Sha224>>(secret, full_seed, out, output_len),
        HashAlgorithm::SHA256 => p_hash_with::<Hmac<Sha256>>(secret, full_seed, out, output_len),
        HashAlgorithm::SHA384 => p_hash_with::<Hmac<Sha384>>(secret, full_seed, out, output_len),
        HashAlgorithm::SHA512 => p_hash_with::<Hmac<Sha512>>(secret, full_seed, out, output_len),
    }
}

/// HMAC keyed once, reset to the keyed state after every record.
struct HmacRecordMac<M> {
    keyed: M,
    ctx: M,
    output_len: usize,
}

impl<M: Mac + KeyInit + Clone> HmacRecordMac<M> {
    fn new(key: &[u8], output_len: usize) -> Result<Self, String> {
        let keyed = <M as KeyInit>::new_from_slice(key)
            .map_err(|_| "Invalid HMAC key length".to_string())?;
        Ok(HmacRecordMac {
            ctx: keyed.clone(),
            keyed,
            output_len,
        })
    }
}

impl<M> fmt::Debug for HmacRecordMac<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacRecordMac")
            .field("output_len", &self.output_len)
            .finish()
    }
}

impl<M> RecordMac for HmacRecordMac<M>
where
    M: Mac + KeyInit + Clone + Send + Sync + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    fn output_len(&self) -> usize {
        self.output_len
    }

    fn update(&mut self, data: &[u8]) {
        self.ctx.update(data);
    }

    fn finalize_reset(&mut self, out: &mut Buf) {
        let ctx = std::mem::replace(&mut self.ctx, self.keyed.clone());
        out.extend_from_slice(&ctx.finalize().into_bytes());
    }
}

/// SSL 3.0 MAC: hash(secret + pad2 + hash(secret + pad1 + data)).
struct Ssl3Mac<D> {
    secret: Zeroizing<Vec<u8>>,
    pad_len: usize,
    // Inner hash primed with secret + pad1.
    primed: D,
    ctx: D,
}

const SSL3_PAD1: u8 = 0x36;
const SSL3_PAD2: u8 = 0x5c;

impl<D: Digest + Clone> Ssl3Mac<D> {
    fn new(secret: &[u8], pad_len: usize) -> Self {
        let mut primed = D::new();
        Digest::update(&mut primed, secret);
        Digest::update(&mut primed, vec![SSL3_PAD1; pad_len]);
        Ssl3Mac {
            secret: Zeroizing::new(secret.to_vec()),
            pad_len,
            ctx: primed.clone(),
            primed,
        }
    }
}

impl<D> fmt::Debug for Ssl3Mac<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ssl3Mac")
            .field("pad_len", &self.pad_len)
            .finish()
    }
}

impl<D> RecordMac for Ssl3Mac<D>
where
    D: Digest + Clone + Send + Sync + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.ctx, data);
    }

    fn finalize_reset(&mut self, out: &mut Buf) {
        let inner = std::mem::replace(&mut self.ctx, self.primed.clone()).finalize();

        let mut outer = D::new();
        Digest::update(&mut outer, &self.secret[..]);
        Digest::update(&mut outer, vec![SSL3_PAD2; self.pad_len]);
        Digest::update(&mut outer, &inner);
        out.extend_from_slice(&outer.finalize());
    }
}

/// MAC provider implementation.
#[derive(Debug)]
pub(super) struct RustCryptoMacProvider;

impl MacProvider for RustCryptoMacProvider {
    fn create_mac(
        &self,
        algorithm: MacAlgorithm,
        ssl3: bool,
        key: &[u8],
    ) -> Result<Box<dyn RecordMac>, String> {
        let output_len = algorithm.output_len();
        match (algorithm, ssl3) {
            (MacAlgorithm::HmacSha1, false) => {
                Ok(Box::new(HmacRecordMac::<Hmac<Sha1>>::new(key, output_len)?))
            }
            (MacAlgorithm::HmacSha256, false) => {
                Ok(Box::new(HmacRecordMac::<Hmac<Sha256>>::new(key, output_len)?))
            }
            // SHA-1 pads are 40 bytes (RFC 6101 §5.2.3.1)
            (MacAlgorithm::HmacSha1, true) => Ok(Box::new(Ssl3Mac::<Sha1>::new(key, 40))),
            (alg, ssl3) => Err(format!("Unsupported MAC {:?} (ssl3: {})", alg, ssl3)),
        }
    }
}

/// Static instance of the MAC provider.
pub(super) static MAC_PROVIDER: RustCryptoMacProvider = RustCryptoMacProvider;
