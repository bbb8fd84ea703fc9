//! Cipher suite implementations using RustCrypto.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256, Block};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, Aes256Gcm, Key};

use crate::buffer::{Buf, TmpBuf};
use crate::crypto::provider::{BlockCipher, Cipher, RecordCipher, SupportedCipherSuite};
use crate::crypto::{Aad, Nonce};
use crate::types::{BulkCipher, CipherSuite, HashAlgorithm};

const AES_BLOCK_LEN: usize = 16;

/// AES-GCM cipher implementation using RustCrypto.
enum AesGcm {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl std::fmt::Debug for AesGcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AesGcm::Aes128(_) => f.debug_tuple("AesGcm::Aes128").finish(),
            AesGcm::Aes256(_) => f.debug_tuple("AesGcm::Aes256").finish(),
        }
    }
}

impl AesGcm {
    fn new(key: &[u8]) -> Result<Self, String> {
        match key.len() {
            16 => {
                let key = Key::<Aes128Gcm>::from_slice(key);
                Ok(AesGcm::Aes128(Box::new(Aes128Gcm::new(key))))
            }
            32 => {
                let key = Key::<Aes256Gcm>::from_slice(key);
                Ok(AesGcm::Aes256(Box::new(Aes256Gcm::new(key))))
            }
            _ => Err(format!("Invalid key size for AES-GCM: {}", key.len())),
        }
    }
}

impl Cipher for AesGcm {
    fn encrypt(&mut self, data: &mut Buf, aad: Aad, nonce: Nonce) -> Result<(), String> {
        let aes_nonce = GenericArray::from_slice(&nonce.0);
        let res = match self {
            AesGcm::Aes128(cipher) => cipher.encrypt_in_place(aes_nonce, &aad, data),
            AesGcm::Aes256(cipher) => cipher.encrypt_in_place(aes_nonce, &aad, data),
        };
        res.map_err(|_| "AES-GCM encryption failed".to_string())
    }

    fn decrypt(&mut self, ciphertext: &mut TmpBuf, aad: Aad, nonce: Nonce) -> Result<(), String> {
        if ciphertext.len() < 16 {
            return Err(format!("Ciphertext too short: {}", ciphertext.len()));
        }
        let aes_nonce = GenericArray::from_slice(&nonce.0);

        // decrypt_in_place removes the tag and shortens the buffer
        let res = match self {
            AesGcm::Aes128(cipher) => cipher.decrypt_in_place(aes_nonce, &aad, ciphertext),
            AesGcm::Aes256(cipher) => cipher.decrypt_in_place(aes_nonce, &aad, ciphertext),
        };
        res.map_err(|_| "AES-GCM decryption failed".to_string())
    }
}

/// AES in CBC mode, chained by hand one block at a time.
enum AesCbc {
    Aes128(Box<Aes128>),
    Aes256(Box<Aes256>),
}

impl std::fmt::Debug for AesCbc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AesCbc::Aes128(_) => f.debug_tuple("AesCbc::Aes128").finish(),
            AesCbc::Aes256(_) => f.debug_tuple("AesCbc::Aes256").finish(),
        }
    }
}

impl AesCbc {
    fn new(key: &[u8]) -> Result<Self, String> {
        let invalid = |_| format!("Invalid key size for AES-CBC: {}", key.len());
        match key.len() {
            16 => Ok(AesCbc::Aes128(Box::new(
                Aes128::new_from_slice(key).map_err(invalid)?,
            ))),
            32 => Ok(AesCbc::Aes256(Box::new(
                Aes256::new_from_slice(key).map_err(invalid)?,
            ))),
            _ => Err(format!("Invalid key size for AES-CBC: {}", key.len())),
        }
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            AesCbc::Aes128(c) => c.encrypt_block(block),
            AesCbc::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            AesCbc::Aes128(c) => c.decrypt_block(block),
            AesCbc::Aes256(c) => c.decrypt_block(block),
        }
    }
}

fn check_cbc_input(iv: &[u8], data: &[u8]) -> Result<(), String> {
    if iv.len() != AES_BLOCK_LEN {
        return Err(format!("Invalid CBC IV length: {}", iv.len()));
    }
    if data.len() % AES_BLOCK_LEN != 0 {
        return Err(format!("CBC data not block aligned: {}", data.len()));
    }
    Ok(())
}

impl BlockCipher for AesCbc {
    fn block_len(&self) -> usize {
        AES_BLOCK_LEN
    }

    fn encrypt_cbc(&mut self, iv: &[u8], data: &mut [u8]) -> Result<(), String> {
        check_cbc_input(iv, data)?;
        let mut prev = [0u8; AES_BLOCK_LEN];
        prev.copy_from_slice(iv);

        for chunk in data.chunks_exact_mut(AES_BLOCK_LEN) {
            for (b, p) in chunk.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            self.encrypt_block(Block::from_mut_slice(chunk));
            prev.copy_from_slice(chunk);
        }
        Ok(())
    }

    fn decrypt_cbc(&mut self, iv: &[u8], data: &mut [u8]) -> Result<(), String> {
        check_cbc_input(iv, data)?;
        let mut prev = [0u8; AES_BLOCK_LEN];
        prev.copy_from_slice(iv);

        for chunk in data.chunks_exact_mut(AES_BLOCK_LEN) {
            let mut saved = [0u8; AES_BLOCK_LEN];
            saved.copy_from_slice(chunk);
            self.decrypt_block(Block::from_mut_slice(chunk));
            for (b, p) in chunk.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            prev = saved;
        }
        Ok(())
    }
}

/// One cipher suite, with parameters taken from the suite's own metadata.
#[derive(Debug)]
struct RustCryptoSuite(CipherSuite);

impl RustCryptoSuite {
    fn bulk(&self) -> Result<BulkCipher, String> {
        self.0
            .bulk_cipher()
            .ok_or_else(|| format!("No bulk cipher for {:?}", self.0))
    }
}

impl SupportedCipherSuite for RustCryptoSuite {
    fn suite(&self) -> CipherSuite {
        self.0
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        self.0.prf_hash()
    }

    fn key_lengths(&self) -> (usize, usize, usize) {
        let mac_len = self.0.mac_algorithm().map(|m| m.output_len()).unwrap_or(0);
        match self.0.bulk_cipher() {
            Some(bulk) => (mac_len, bulk.key_len(), bulk.fixed_iv_len()),
            None => (mac_len, 0, 0),
        }
    }

    fn create_cipher(&self, key: &[u8]) -> Result<RecordCipher, String> {
        let cipher = match self.bulk()? {
            BulkCipher::Null => RecordCipher::Null,
            BulkCipher::Aes128Cbc | BulkCipher::Aes256Cbc => {
                RecordCipher::Cbc(Box::new(AesCbc::new(key)?))
            }
            BulkCipher::Aes128Gcm | BulkCipher::Aes256Gcm => {
                RecordCipher::Aead(Box::new(AesGcm::new(key)?))
            }
        };
        Ok(cipher)
    }
}

static RSA_WITH_NULL_SHA: RustCryptoSuite = RustCryptoSuite(CipherSuite::RSA_WITH_NULL_SHA);
static RSA_WITH_NULL_SHA256: RustCryptoSuite = RustCryptoSuite(CipherSuite::RSA_WITH_NULL_SHA256);
static RSA_WITH_AES_128_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_128_CBC_SHA);
static RSA_WITH_AES_256_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_256_CBC_SHA);
static DHE_RSA_WITH_AES_128_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::DHE_RSA_WITH_AES_128_CBC_SHA);
static DHE_RSA_WITH_AES_256_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::DHE_RSA_WITH_AES_256_CBC_SHA);
static ECDHE_RSA_WITH_AES_128_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::ECDHE_RSA_WITH_AES_128_CBC_SHA);
static ECDHE_RSA_WITH_AES_256_CBC_SHA: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::ECDHE_RSA_WITH_AES_256_CBC_SHA);
static RSA_WITH_AES_128_CBC_SHA256: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_128_CBC_SHA256);
static RSA_WITH_AES_256_CBC_SHA256: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_256_CBC_SHA256);
static RSA_WITH_AES_128_GCM_SHA256: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_128_GCM_SHA256);
static RSA_WITH_AES_256_GCM_SHA384: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::RSA_WITH_AES_256_GCM_SHA384);
static ECDHE_RSA_WITH_AES_128_GCM_SHA256: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::ECDHE_RSA_WITH_AES_128_GCM_SHA256);
static ECDHE_RSA_WITH_AES_256_GCM_SHA384: RustCryptoSuite =
    RustCryptoSuite(CipherSuite::ECDHE_RSA_WITH_AES_256_GCM_SHA384);

/// All supported cipher suites.
pub(super) static ALL_CIPHER_SUITES: &[&dyn SupportedCipherSuite] = &[
    &ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    &ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    &RSA_WITH_AES_256_GCM_SHA384,
    &RSA_WITH_AES_128_GCM_SHA256,
    &RSA_WITH_AES_256_CBC_SHA256,
    &RSA_WITH_AES_128_CBC_SHA256,
    &ECDHE_RSA_WITH_AES_256_CBC_SHA,
    &ECDHE_RSA_WITH_AES_128_CBC_SHA,
    &DHE_RSA_WITH_AES_256_CBC_SHA,
    &DHE_RSA_WITH_AES_128_CBC_SHA,
    &RSA_WITH_AES_256_CBC_SHA,
    &RSA_WITH_AES_128_CBC_SHA,
    &RSA_WITH_NULL_SHA256,
    &RSA_WITH_NULL_SHA,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_chain_matches_single_blocks() {
        let key = [3u8; 16];
        let iv = [9u8; 16];
        let mut cbc = AesCbc::new(&key).unwrap();

        let plain = [0x42u8; 32];
        let mut data = plain;
        cbc.encrypt_cbc(&iv, &mut data).unwrap();

        // Encrypting the second block alone with the first ciphertext block
        // as IV gives the same result.
        let mut second = [0x42u8; 16];
        cbc.encrypt_cbc(&data[..16], &mut second).unwrap();
        assert_eq!(&data[16..], &second[..]);

        cbc.decrypt_cbc(&iv, &mut data).unwrap();
        assert_eq!(data, plain);
    }

    #[test]
    fn cbc_rejects_unaligned() {
        let mut cbc = AesCbc::new(&[0u8; 32]).unwrap();
        let mut data = [0u8; 15];
        assert!(cbc.encrypt_cbc(&[0u8; 16], &mut data).is_err());
    }

    #[test]
    fn key_lengths_per_suite() {
        assert_eq!(RSA_WITH_AES_128_CBC_SHA.key_lengths(), (20, 16, 16));
        assert_eq!(RSA_WITH_AES_256_CBC_SHA256.key_lengths(), (32, 32, 16));
        assert_eq!(RSA_WITH_AES_128_GCM_SHA256.key_lengths(), (0, 16, 4));
        assert_eq!(RSA_WITH_NULL_SHA.key_lengths(), (20, 0, 0));
    }

    #[test]
    fn gcm_detects_tamper() {
        let mut gcm = AesGcm::new(&[5u8; 16]).unwrap();
        let nonce = Nonce([1u8; 12]);
        let aad = || Aad(tinyvec::array_vec!([u8; 13] => 1, 2, 3));

        let mut buf = Buf::from_slice(b"hello");
        gcm.encrypt(&mut buf, aad(), nonce).unwrap();
        assert_eq!(buf.len(), 5 + 16);

        buf[0] ^= 1;
        let mut tmp = TmpBuf::new(&mut buf);
        assert!(gcm.decrypt(&mut tmp, aad(), nonce).is_err());
    }
}
