//! Cipher states for both directions and record protection.

use std::fmt;

use subtle::{Choice, ConstantTimeEq, ConstantTimeLess};
use zeroize::Zeroizing;

use crate::buffer::{Buf, TmpBuf};
use crate::crypto::{Aad, CryptoProvider, Iv, KeyBlock, Nonce, RecordCipher, RecordMac};
use crate::crypto::{AEAD_OVERHEAD, EXPLICIT_NONCE_LEN};
use crate::record::MAX_PLAINTEXT_LEN;
use crate::rng::SeededRng;
use crate::types::{CipherSuite, ContentType, ProtocolVersion};
use crate::Error;

/// Cryptographic state of one direction: cipher, MAC, IV and sequence number.
///
/// The default is the identity state used before the first ChangeCipherSpec.
pub struct CipherState {
    suite: Option<CipherSuite>,
    implementation: Option<&'static str>,
    cipher: RecordCipher,
    mac: Option<Box<dyn RecordMac>>,
    // CBC: chained IV. GCM: fixed nonce prefix.
    iv: Zeroizing<Vec<u8>>,
    ssl3: bool,
    seq: u64,
}

impl CipherState {
    pub fn identity() -> Self {
        CipherState {
            suite: None,
            implementation: None,
            cipher: RecordCipher::Null,
            mac: None,
            iv: Zeroizing::new(Vec::new()),
            ssl3: false,
            seq: 0,
        }
    }

    fn new(
        provider: &CryptoProvider,
        suite: CipherSuite,
        version: ProtocolVersion,
        mac_key: &[u8],
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self, Error> {
        let supported = provider
            .find_suite(suite.as_u16())
            .ok_or(Error::UnsupportedCipherSuite(suite.as_u16()))?;
        let cipher = supported.create_cipher(key).map_err(Error::CryptoError)?;

        let mac = match suite.mac_algorithm() {
            Some(alg) if alg.output_len() > 0 => Some(
                provider
                    .mac_provider
                    .create_mac(alg, version.is_ssl3(), mac_key)
                    .map_err(Error::CryptoError)?,
            ),
            _ => None,
        };

        Ok(CipherState {
            suite: Some(suite),
            implementation: Some(provider.name),
            cipher,
            mac,
            iv: Zeroizing::new(iv.to_vec()),
            ssl3: version.is_ssl3(),
            seq: 0,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.suite.is_none()
    }

    pub fn suite(&self) -> Option<CipherSuite> {
        self.suite
    }

    pub fn implementation(&self) -> Option<&'static str> {
        self.implementation
    }

    #[cfg(test)]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_cbc(&self) -> bool {
        matches!(self.cipher, RecordCipher::Cbc(_))
    }

    fn next_seq(&mut self) -> Result<u64, Error> {
        let seq = self.seq;
        self.seq = seq
            .checked_add(1)
            .ok_or_else(|| Error::CryptoError("sequence number overflow".into()))?;
        Ok(seq)
    }

    /// Protect `plaintext` into `out` as the payload of one record.
    pub fn protect(
        &mut self,
        version: ProtocolVersion,
        content_type: ContentType,
        plaintext: &[u8],
        out: &mut Buf,
        rng: &mut SeededRng,
    ) -> Result<(), Error> {
        out.clear();
        if self.is_identity() {
            out.extend_from_slice(plaintext);
            return Ok(());
        }

        let seq = self.next_seq()?;

        if let RecordCipher::Aead(cipher) = &mut self.cipher {
            let explicit = seq.to_be_bytes();
            let iv = Iv::new(&self.iv)
                .ok_or_else(|| Error::CryptoError("bad AEAD fixed IV".into()))?;
            let nonce = Nonce::new(iv, &explicit);
            let aad = Aad::new(content_type, seq, version, plaintext.len() as u16);

            let mut body = Buf::from_slice(plaintext);
            cipher
                .encrypt(&mut body, aad, nonce)
                .map_err(Error::CryptoError)?;

            out.extend_from_slice(&explicit);
            out.extend_from_slice(&body);
            return Ok(());
        }

        out.extend_from_slice(plaintext);
        if let Some(mac) = &mut self.mac {
            write_mac(&mut **mac, self.ssl3, seq, content_type, version, plaintext, out);
        }

        if let RecordCipher::Cbc(cipher) = &mut self.cipher {
            let block_len = cipher.block_len();
            let pad_len = block_len - 1 - (out.len() % block_len);
            // SSL 3.0 padding content is arbitrary; only the length byte counts.
            out.resize(out.len() + pad_len + 1, pad_len as u8);

            if version.has_explicit_iv() {
                let mut iv = vec![0u8; block_len];
                rng.fill(&mut iv);
                cipher.encrypt_cbc(&iv, out).map_err(Error::CryptoError)?;
                let mut framed = Buf::new();
                framed.extend_from_slice(&iv);
                framed.extend_from_slice(out);
                std::mem::swap(out, &mut framed);
            } else {
                cipher
                    .encrypt_cbc(&self.iv, out)
                    .map_err(Error::CryptoError)?;
                let last = out.len() - block_len;
                self.iv.copy_from_slice(&out[last..]);
            }
        }

        Ok(())
    }

    /// Unprotect a received record payload in place, returning the plaintext.
    ///
    /// Every MAC, padding or length problem is reported as `bad_record_mac`.
    pub fn unprotect<'a>(
        &mut self,
        version: ProtocolVersion,
        content_type: ContentType,
        payload: &'a mut [u8],
    ) -> Result<&'a [u8], Error> {
        if self.is_identity() {
            return check_plaintext_len(payload);
        }

        let seq = self.next_seq()?;

        if let RecordCipher::Aead(cipher) = &mut self.cipher {
            if payload.len() < AEAD_OVERHEAD {
                return Err(Error::BadRecordMac);
            }
            let mut explicit = [0u8; EXPLICIT_NONCE_LEN];
            explicit.copy_from_slice(&payload[..EXPLICIT_NONCE_LEN]);
            let iv = Iv::new(&self.iv)
                .ok_or_else(|| Error::CryptoError("bad AEAD fixed IV".into()))?;
            let nonce = Nonce::new(iv, &explicit);
            let plaintext_len = payload.len() - AEAD_OVERHEAD;
            if plaintext_len > MAX_PLAINTEXT_LEN {
                return Err(Error::RecordOverflow(plaintext_len));
            }
            let aad = Aad::new(content_type, seq, version, plaintext_len as u16);

            let body = &mut payload[EXPLICIT_NONCE_LEN..];
            let mut tmp = TmpBuf::new(body);
            cipher
                .decrypt(&mut tmp, aad, nonce)
                .map_err(|_| Error::BadRecordMac)?;
            let len = tmp.len();
            return check_plaintext_len(&payload[EXPLICIT_NONCE_LEN..EXPLICIT_NONCE_LEN + len]);
        }

        let mac_len = self.mac.as_ref().map(|m| m.output_len()).unwrap_or(0);

        let (data, pad_ok): (&mut [u8], Choice) = match &mut self.cipher {
            RecordCipher::Cbc(cipher) => {
                let block_len = cipher.block_len();
                let explicit = version.has_explicit_iv();
                let iv_len = if explicit { block_len } else { 0 };
                let body_len = payload.len().saturating_sub(iv_len);
                if payload.len() < iv_len + block_len
                    || body_len % block_len != 0
                    || body_len < mac_len + 1
                {
                    return Err(Error::BadRecordMac);
                }

                let (iv_part, body) = payload.split_at_mut(iv_len);
                if explicit {
                    cipher.decrypt_cbc(iv_part, body).map_err(Error::CryptoError)?;
                } else {
                    let mut next_iv = [0u8; 16];
                    let tail = &body[body.len() - block_len..];
                    next_iv[..block_len].copy_from_slice(tail);
                    cipher.decrypt_cbc(&self.iv, body).map_err(Error::CryptoError)?;
                    self.iv.copy_from_slice(&next_iv[..block_len]);
                }

                let (pad_len, pad_ok) = check_padding(body, mac_len, block_len, self.ssl3);
                let data_len = body.len() - pad_len - 1;
                (&mut body[..data_len], pad_ok)
            }
            RecordCipher::Null => {
                if payload.len() < mac_len {
                    return Err(Error::BadRecordMac);
                }
                (payload, Choice::from(1))
            }
            RecordCipher::Aead(_) => unreachable!("handled above"),
        };

        let plaintext_len = data.len() - mac_len;
        let (plaintext, received_mac) = data.split_at(plaintext_len);

        let mut computed = Buf::new();
        if let Some(mac) = &mut self.mac {
            write_mac(
                &mut **mac,
                self.ssl3,
                seq,
                content_type,
                version,
                plaintext,
                &mut computed,
            );
        }
        let mac_ok = computed.ct_eq(received_mac);

        if !bool::from(mac_ok & pad_ok) {
            return Err(Error::BadRecordMac);
        }

        check_plaintext_len(plaintext)
    }
}

fn check_plaintext_len(plaintext: &[u8]) -> Result<&[u8], Error> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(Error::RecordOverflow(plaintext.len()));
    }
    Ok(plaintext)
}

/// MAC input: seq(8) ‖ type(1) ‖ [version(2)] ‖ length(2) ‖ data.
/// SSL 3.0 leaves out the version.
fn write_mac(
    mac: &mut dyn RecordMac,
    ssl3: bool,
    seq: u64,
    content_type: ContentType,
    version: ProtocolVersion,
    data: &[u8],
    out: &mut Buf,
) {
    mac.update(&seq.to_be_bytes());
    mac.update(&[content_type.as_u8()]);
    if !ssl3 {
        mac.update(&version.to_bytes());
    }
    mac.update(&(data.len() as u16).to_be_bytes());
    mac.update(data);
    mac.finalize_reset(out);
}

/// Validate CBC padding after decryption.
///
/// Returns the padding length to strip (excluding the length byte) and
/// whether the padding is valid. On failure a length of 0 is returned so
/// the MAC is still computed over a plausible span.
fn check_padding(body: &[u8], mac_len: usize, block_len: usize, ssl3: bool) -> (usize, Choice) {
    let last = body.len() - 1;
    let pad_len = body[last] as usize;

    // Room for MAC, padding and the length byte.
    let fits = Choice::from((pad_len + 1 + mac_len <= body.len()) as u8);
    if !bool::from(fits) {
        return (0, Choice::from(0));
    }

    let ok = if ssl3 {
        // SSL 3.0 only requires the padding to be shorter than a block.
        (pad_len as u64).ct_lt(&(block_len as u64))
    } else {
        let mut ok = Choice::from(1);
        for b in &body[last - pad_len..last] {
            ok &= b.ct_eq(&(pad_len as u8));
        }
        ok
    };

    if bool::from(ok) {
        (pad_len, ok)
    } else {
        (0, ok)
    }
}

impl Default for CipherState {
    fn default() -> Self {
        CipherState::identity()
    }
}

impl fmt::Debug for CipherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherState")
            .field("suite", &self.suite)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Current and pending cipher state for one direction.
#[derive(Debug, Default)]
pub struct DirectionState {
    pub current: CipherState,
    pub pending: Option<CipherState>,
}

impl DirectionState {
    /// Make the pending state current. Its sequence number starts at 0.
    pub fn activate(&mut self) -> Result<(), Error> {
        let pending = self.pending.take().ok_or(Error::NoPendingState)?;
        self.current = pending;
        self.current.seq = 0;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current = CipherState::identity();
        self.pending = None;
    }
}

/// Both directions of a connection plus the IV generator.
#[derive(Debug)]
pub struct CryptoContext {
    pub read: DirectionState,
    pub write: DirectionState,
    rng: SeededRng,
}

impl CryptoContext {
    pub fn new(rng_seed: Option<u64>) -> Self {
        CryptoContext {
            read: DirectionState::default(),
            write: DirectionState::default(),
            rng: SeededRng::new(rng_seed),
        }
    }

    /// Derive keys for `suite_id` and store them as the pending states.
    #[allow(clippy::too_many_arguments)]
    pub fn calc_pending_states(
        &mut self,
        provider: &CryptoProvider,
        version: ProtocolVersion,
        is_client: bool,
        suite_id: u16,
        master_secret: &[u8],
        client_random: &[u8],
        server_random: &[u8],
    ) -> Result<(), Error> {
        let supported = provider
            .find_suite(suite_id)
            .ok_or(Error::UnsupportedCipherSuite(suite_id))?;
        let suite = supported.suite();
        if suite.min_version() > version {
            return Err(Error::UnsupportedCipherSuite(suite_id));
        }

        let keys = KeyBlock::derive(
            provider,
            supported,
            version,
            master_secret,
            client_random,
            server_random,
        )?;

        let client = CipherState::new(
            provider,
            suite,
            version,
            keys.client_mac(),
            keys.client_key(),
            keys.client_iv(),
        )?;
        let server = CipherState::new(
            provider,
            suite,
            version,
            keys.server_mac(),
            keys.server_key(),
            keys.server_iv(),
        )?;

        let (write, read) = if is_client {
            (client, server)
        } else {
            (server, client)
        };
        self.write.pending = Some(write);
        self.read.pending = Some(read);

        debug!("Pending states computed for {:?} at {}", suite, version);
        Ok(())
    }

    pub fn protect(
        &mut self,
        version: ProtocolVersion,
        content_type: ContentType,
        plaintext: &[u8],
        out: &mut Buf,
    ) -> Result<(), Error> {
        self.write
            .current
            .protect(version, content_type, plaintext, out, &mut self.rng)
    }

    pub fn unprotect<'a>(
        &mut self,
        version: ProtocolVersion,
        content_type: ContentType,
        payload: &'a mut [u8],
    ) -> Result<&'a [u8], Error> {
        self.read.current.unprotect(version, content_type, payload)
    }

    pub fn reset(&mut self) {
        self.read.reset();
        self.write.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::rust_crypto;

    const MASTER: [u8; 48] = [0x11; 48];
    const CLIENT_RANDOM: [u8; 32] = [0x22; 32];
    const SERVER_RANDOM: [u8; 32] = [0x33; 32];

    fn pair(suite: u16, version: ProtocolVersion) -> (CryptoContext, CryptoContext) {
        let provider = rust_crypto::default_provider();
        let mut client = CryptoContext::new(Some(1));
        let mut server = CryptoContext::new(Some(2));
        for (ctx, is_client) in [(&mut client, true), (&mut server, false)] {
            ctx.calc_pending_states(
                &provider,
                version,
                is_client,
                suite,
                &MASTER,
                &CLIENT_RANDOM,
                &SERVER_RANDOM,
            )
            .unwrap();
            ctx.read.activate().unwrap();
            ctx.write.activate().unwrap();
        }
        (client, server)
    }

    fn roundtrip(suite: u16, version: ProtocolVersion) {
        let (mut client, mut server) = pair(suite, version);
        for msg in [&b"hello"[..], &[0u8; 0][..], &[0xabu8; 1000][..]] {
            let mut out = Buf::new();
            client
                .protect(version, ContentType::ApplicationData, msg, &mut out)
                .unwrap();
            if !msg.is_empty() {
                assert_ne!(&out[..msg.len().min(out.len())], msg);
            }
            let mut wire = out.to_vec();
            let plain = server
                .unprotect(version, ContentType::ApplicationData, &mut wire)
                .unwrap();
            assert_eq!(plain, msg);
        }
        assert_eq!(client.write.current.seq(), 3);
        assert_eq!(server.read.current.seq(), 3);
    }

    #[test]
    fn null_sha_roundtrip() {
        let (mut client, mut server) = pair(0x0002, ProtocolVersion::TLS1_0);
        let mut out = Buf::new();
        client
            .protect(ProtocolVersion::TLS1_0, ContentType::Handshake, b"abc", &mut out)
            .unwrap();
        assert_eq!(out.len(), 3 + 20);
        assert_eq!(&out[..3], b"abc");
        let mut wire = out.to_vec();
        let plain = server
            .unprotect(ProtocolVersion::TLS1_0, ContentType::Handshake, &mut wire)
            .unwrap();
        assert_eq!(plain, b"abc");
    }

    #[test]
    fn cbc_tls10_implicit_iv_roundtrip() {
        roundtrip(0x002F, ProtocolVersion::TLS1_0);
    }

    #[test]
    fn cbc_tls12_explicit_iv_roundtrip() {
        roundtrip(0x0035, ProtocolVersion::TLS1_2);
        roundtrip(0x003C, ProtocolVersion::TLS1_2);
    }

    #[test]
    fn ssl3_roundtrip() {
        roundtrip(0x002F, ProtocolVersion::SSL3_0);
    }

    #[test]
    fn gcm_roundtrip() {
        roundtrip(0x009C, ProtocolVersion::TLS1_2);
        roundtrip(0xC030, ProtocolVersion::TLS1_2);
    }

    #[test]
    fn gcm_wire_format() {
        let (mut client, _) = pair(0x009C, ProtocolVersion::TLS1_2);
        let mut out = Buf::new();
        client
            .protect(ProtocolVersion::TLS1_2, ContentType::ApplicationData, b"x", &mut out)
            .unwrap();
        assert_eq!(out.len(), 8 + 1 + 16);
        assert_eq!(&out[..8], &0u64.to_be_bytes());
    }

    #[test]
    fn tamper_is_bad_record_mac() {
        for (suite, version) in [
            (0x0002, ProtocolVersion::TLS1_0),
            (0x002F, ProtocolVersion::TLS1_0),
            (0x002F, ProtocolVersion::TLS1_2),
            (0x002F, ProtocolVersion::SSL3_0),
            (0x009C, ProtocolVersion::TLS1_2),
        ] {
            let (mut client, mut server) = pair(suite, version);
            let mut out = Buf::new();
            client
                .protect(version, ContentType::ApplicationData, b"attack at dawn", &mut out)
                .unwrap();
            let mut wire = out.to_vec();
            let idx = wire.len() - 1;
            wire[idx] ^= 0x01;
            let err = server
                .unprotect(version, ContentType::ApplicationData, &mut wire)
                .unwrap_err();
            assert!(matches!(err, Error::BadRecordMac), "{:04x} {}", suite, version);
        }
    }

    #[test]
    fn wrong_content_type_fails_mac() {
        let (mut client, mut server) = pair(0x002F, ProtocolVersion::TLS1_1);
        let mut out = Buf::new();
        client
            .protect(ProtocolVersion::TLS1_1, ContentType::Handshake, b"data", &mut out)
            .unwrap();
        let mut wire = out.to_vec();
        assert!(matches!(
            server.unprotect(ProtocolVersion::TLS1_1, ContentType::ApplicationData, &mut wire),
            Err(Error::BadRecordMac)
        ));
    }

    #[test]
    fn short_records_rejected() {
        let (_, mut server) = pair(0x002F, ProtocolVersion::TLS1_2);
        let mut wire = vec![0u8; 16];
        assert!(matches!(
            server.unprotect(ProtocolVersion::TLS1_2, ContentType::ApplicationData, &mut wire),
            Err(Error::BadRecordMac)
        ));
        let mut wire = vec![0u8; 33];
        assert!(matches!(
            server.unprotect(ProtocolVersion::TLS1_2, ContentType::ApplicationData, &mut wire),
            Err(Error::BadRecordMac)
        ));
    }

    #[test]
    fn activation_resets_sequence() {
        let (mut client, _) = pair(0x002F, ProtocolVersion::TLS1_2);
        let mut out = Buf::new();
        client
            .protect(ProtocolVersion::TLS1_2, ContentType::ApplicationData, b"a", &mut out)
            .unwrap();
        assert_eq!(client.write.current.seq(), 1);

        let provider = rust_crypto::default_provider();
        client
            .calc_pending_states(
                &provider,
                ProtocolVersion::TLS1_2,
                true,
                0x009C,
                &MASTER,
                &CLIENT_RANDOM,
                &SERVER_RANDOM,
            )
            .unwrap();
        // Pending does not disturb current
        assert_eq!(client.write.current.seq(), 1);
        client.write.activate().unwrap();
        assert_eq!(client.write.current.seq(), 0);
        assert_eq!(
            client.write.current.suite(),
            Some(CipherSuite::RSA_WITH_AES_128_GCM_SHA256)
        );
    }

    #[test]
    fn activating_empty_pending_fails() {
        let mut ctx = CryptoContext::new(None);
        assert!(matches!(ctx.read.activate(), Err(Error::NoPendingState)));
    }

    #[test]
    fn unsupported_suites() {
        let provider = rust_crypto::default_provider();
        let mut ctx = CryptoContext::new(None);
        let err = ctx
            .calc_pending_states(
                &provider,
                ProtocolVersion::TLS1_2,
                true,
                0x1301,
                &MASTER,
                &CLIENT_RANDOM,
                &SERVER_RANDOM,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCipherSuite(0x1301)));

        // GCM needs TLS 1.2
        let err = ctx
            .calc_pending_states(
                &provider,
                ProtocolVersion::TLS1_0,
                true,
                0x009C,
                &MASTER,
                &CLIENT_RANDOM,
                &SERVER_RANDOM,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCipherSuite(0x009C)));
        assert!(ctx.write.pending.is_none());
    }

    #[test]
    fn identity_passthrough() {
        let mut ctx = CryptoContext::new(None);
        let mut out = Buf::new();
        ctx.protect(ProtocolVersion::TLS1_0, ContentType::Handshake, b"plain", &mut out)
            .unwrap();
        assert_eq!(&out[..], b"plain");
        let mut wire = out.to_vec();
        assert_eq!(
            ctx.unprotect(ProtocolVersion::TLS1_0, ContentType::Handshake, &mut wire)
                .unwrap(),
            b"plain"
        );
        // Identity does not count records
        assert_eq!(ctx.write.current.seq(), 0);
    }
}
