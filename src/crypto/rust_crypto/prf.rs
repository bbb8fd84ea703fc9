//! Key derivation PRFs for SSL 3.0, TLS 1.0/1.1 and TLS 1.2 using RustCrypto.

use md5::Md5;
use sha1::{Digest, Sha1};
use zeroize::Zeroize;

use crate::buffer::Buf;
use crate::crypto::provider::PrfProvider;
use crate::types::HashAlgorithm;

use super::hmac;

/// PRF provider implementation.
#[derive(Debug)]
pub(super) struct RustCryptoPrfProvider;

fn full_seed(scratch: &mut Buf, label: &str, seed: &[u8]) -> Result<(), String> {
    if !label.is_ascii() {
        return Err("PRF label must be ASCII".to_string());
    }
    scratch.clear();
    scratch.extend_from_slice(label.as_bytes());
    scratch.extend_from_slice(seed);
    Ok(())
}

impl PrfProvider for RustCryptoPrfProvider {
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
        scratch: &mut Buf,
        hash: HashAlgorithm,
    ) -> Result<(), String> {
        full_seed(scratch, label, seed)?;
        hmac::p_hash(hash, secret, scratch, out, output_len)
    }

    fn prf_tls10(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
        scratch: &mut Buf,
    ) -> Result<(), String> {
        full_seed(scratch, label, seed)?;

        // The halves overlap by one byte when the secret length is odd.
        let half = secret.len().div_ceil(2);
        let s1 = &secret[..half];
        let s2 = &secret[secret.len() - half..];

        hmac::p_hash(HashAlgorithm::MD5, s1, scratch, out, output_len)?;

        let mut sha = Buf::new();
        hmac::p_hash(HashAlgorithm::SHA1, s2, scratch, &mut sha, output_len)?;

        for (o, s) in out.iter_mut().zip(sha.iter()) {
            *o ^= s;
        }
        sha.zeroize();

        Ok(())
    }

    fn ssl3_key_block(
        &self,
        secret: &[u8],
        seed: &[u8],
        out: &mut Buf,
        output_len: usize,
    ) -> Result<(), String> {
        out.clear();

        // Labels run 'A', 'BB', 'CCC', ... up to 26 rounds of 16 bytes.
        for i in 0..26u8 {
            if out.len() >= output_len {
                break;
            }
            let label = vec![b'A' + i; i as usize + 1];

            let mut sha = Sha1::new();
            sha.update(&label);
            sha.update(secret);
            sha.update(seed);
            let inner = sha.finalize();

            let mut md5 = Md5::new();
            md5.update(secret);
            md5.update(inner);
            out.extend_from_slice(&md5.finalize());
        }

        if out.len() < output_len {
            return Err(format!("SSL 3.0 key block too long: {}", output_len));
        }
        out.truncate(output_len);
        Ok(())
    }
}

/// Static instance of the PRF provider.
pub(super) static PRF_PROVIDER: RustCryptoPrfProvider = RustCryptoPrfProvider;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls10_prf_is_md5_xor_sha1() {
        let secret = [0x0bu8; 48];
        let mut out = Buf::new();
        let mut scratch = Buf::new();
        PRF_PROVIDER
            .prf_tls10(&secret, "key expansion", b"seed", &mut out, 104, &mut scratch)
            .unwrap();
        assert_eq!(out.len(), 104);

        let mut md5_part = Buf::new();
        let mut sha_part = Buf::new();
        hmac::p_hash(HashAlgorithm::MD5, &secret[..24], b"key expansionseed", &mut md5_part, 104)
            .unwrap();
        hmac::p_hash(HashAlgorithm::SHA1, &secret[24..], b"key expansionseed", &mut sha_part, 104)
            .unwrap();
        let expected: Vec<u8> = md5_part.iter().zip(sha_part.iter()).map(|(a, b)| a ^ b).collect();
        assert_eq!(&out[..], &expected[..]);
    }

    #[test]
    fn tls12_prf_prefixes_label() {
        let mut out = Buf::new();
        let mut scratch = Buf::new();
        PRF_PROVIDER
            .prf_tls12(b"s", "lbl", b"seed", &mut out, 20, &mut scratch, HashAlgorithm::SHA256)
            .unwrap();

        let mut direct = Buf::new();
        hmac::p_hash(HashAlgorithm::SHA256, b"s", b"lblseed", &mut direct, 20).unwrap();
        assert_eq!(&out[..], &direct[..]);
    }

    #[test]
    fn ssl3_key_block_first_round() {
        let secret = [1u8; 48];
        let seed = [2u8; 64];
        let mut out = Buf::new();
        PRF_PROVIDER.ssl3_key_block(&secret, &seed, &mut out, 40).unwrap();
        assert_eq!(out.len(), 40);

        let mut sha = Sha1::new();
        sha.update(b"A");
        sha.update(secret);
        sha.update(seed);
        let mut md5 = Md5::new();
        md5.update(secret);
        md5.update(sha.finalize());
        assert_eq!(&out[..16], &md5.finalize()[..]);
    }

    #[test]
    fn ssl3_key_block_too_long() {
        let mut out = Buf::new();
        assert!(PRF_PROVIDER.ssl3_key_block(&[0; 48], &[0; 64], &mut out, 1000).is_err());
    }
}
