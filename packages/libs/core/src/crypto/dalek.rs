//! Ed25519 기반 capability 구현
//!
//! - 서명: Ed25519
//! - 암호화: Ed25519 키를 X25519로 변환한 뒤, 임시 X25519 키 합의 →
//!   HKDF-SHA256 → ChaCha20-Poly1305 sealed box
//!
//! 암호문 형식: `ephemeral_public(32) || nonce(12) || ciphertext`

use chacha20poly1305::{aead::Aead, aead::KeyInit, ChaCha20Poly1305, Key, Nonce};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, StaticSecret};
use zeroize::Zeroizing;

use super::{CryptoCapability, CryptoError, CryptoResult, PrivateKey, PublicKey};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const SEAL_INFO: &[u8] = b"cardauth sealed box v1";

/// Ed25519 / X25519 capability
#[derive(Debug, Clone, Copy, Default)]
pub struct DalekCrypto;

impl DalekCrypto {
    pub fn new() -> Self {
        Self
    }

    fn signing_key(key: &PrivateKey) -> CryptoResult<SigningKey> {
        let seed: [u8; KEY_LEN] = key
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("private key must be 32 bytes".to_string()))?;
        Ok(SigningKey::from_bytes(&seed))
    }

    fn verifying_key(key: &PublicKey) -> CryptoResult<VerifyingKey> {
        let bytes: [u8; KEY_LEN] = key
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("public key must be 32 bytes".to_string()))?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    fn seal_key(
        shared: &[u8],
        ephemeral: &x25519_dalek::PublicKey,
        recipient: &x25519_dalek::PublicKey,
    ) -> CryptoResult<Zeroizing<[u8; KEY_LEN]>> {
        let mut salt = [0u8; 2 * KEY_LEN];
        salt[..KEY_LEN].copy_from_slice(ephemeral.as_bytes());
        salt[KEY_LEN..].copy_from_slice(recipient.as_bytes());

        let hk = Hkdf::<Sha256>::new(Some(&salt), shared);
        let mut okm = Zeroizing::new([0u8; KEY_LEN]);
        hk.expand(SEAL_INFO, &mut okm[..])
            .map_err(|_| CryptoError::Encryption)?;
        Ok(okm)
    }
}

impl CryptoCapability for DalekCrypto {
    fn algorithm(&self) -> &'static str {
        "EdDSA"
    }

    fn generate_private_key(&self) -> CryptoResult<PrivateKey> {
        let key = SigningKey::generate(&mut OsRng);
        Ok(PrivateKey::from_validated(key.to_bytes().to_vec()))
    }

    fn import_private_key(&self, data: &[u8]) -> CryptoResult<PrivateKey> {
        if data.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "private key must be {KEY_LEN} bytes, got {}",
                data.len()
            )));
        }
        Ok(PrivateKey::from_validated(data.to_vec()))
    }

    fn import_public_key(&self, data: &[u8]) -> CryptoResult<PublicKey> {
        let key = PublicKey::from_validated(data.to_vec());
        Self::verifying_key(&key)?;
        Ok(key)
    }

    fn export_private_key(&self, key: &PrivateKey) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(key.as_bytes().to_vec())
    }

    fn export_public_key(&self, key: &PublicKey) -> Vec<u8> {
        key.as_bytes().to_vec()
    }

    fn extract_public_key(&self, key: &PrivateKey) -> CryptoResult<PublicKey> {
        let signing = Self::signing_key(key)?;
        Ok(PublicKey::from_validated(
            signing.verifying_key().to_bytes().to_vec(),
        ))
    }

    fn sign(&self, data: &[u8], key: &PrivateKey) -> CryptoResult<Vec<u8>> {
        let signing = Self::signing_key(key)?;
        Ok(signing.sign(data).to_bytes().to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], key: &PublicKey) -> CryptoResult<bool> {
        let verifying = Self::verifying_key(key)?;
        let signature =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        Ok(verifying.verify(data, &signature).is_ok())
    }

    fn encrypt(&self, data: &[u8], recipient: &PublicKey) -> CryptoResult<Vec<u8>> {
        let montgomery = Self::verifying_key(recipient)?.to_montgomery();
        let recipient = x25519_dalek::PublicKey::from(montgomery.to_bytes());

        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&recipient);
        if !shared.was_contributory() {
            return Err(CryptoError::Encryption);
        }

        let key = Self::seal_key(shared.as_bytes(), &ephemeral_public, &recipient)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), data)
            .map_err(|_| CryptoError::Encryption)?;

        let mut payload = Vec::with_capacity(KEY_LEN + NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(ephemeral_public.as_bytes());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(payload)
    }

    fn decrypt(&self, data: &[u8], key: &PrivateKey) -> CryptoResult<Vec<u8>> {
        if data.len() <= KEY_LEN + NONCE_LEN {
            return Err(CryptoError::Decryption);
        }

        let (ephemeral_bytes, rest) = data.split_at(KEY_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let mut ephemeral = [0u8; KEY_LEN];
        ephemeral.copy_from_slice(ephemeral_bytes);
        let ephemeral_public = x25519_dalek::PublicKey::from(ephemeral);

        let secret = StaticSecret::from(Self::signing_key(key)?.to_scalar_bytes());
        let recipient = x25519_dalek::PublicKey::from(&secret);
        let shared = secret.diffie_hellman(&ephemeral_public);
        if !shared.was_contributory() {
            return Err(CryptoError::Decryption);
        }

        let key = Self::seal_key(shared.as_bytes(), &ephemeral_public, &recipient)
            .map_err(|_| CryptoError::Decryption)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decryption)
    }

    fn fingerprint(&self, key: &PublicKey) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let crypto = DalekCrypto::new();
        let private = crypto.generate_private_key().unwrap();
        let public = crypto.extract_public_key(&private).unwrap();

        let signature = crypto.sign(b"payload", &private).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(crypto.verify(b"payload", &signature, &public).unwrap());
        assert!(!crypto.verify(b"other", &signature, &public).unwrap());

        let other = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();
        assert!(!crypto.verify(b"payload", &signature, &other).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let crypto = DalekCrypto::new();
        let public = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();
        assert!(matches!(
            crypto.verify(b"payload", b"short", &public),
            Err(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let crypto = DalekCrypto::new();
        let private = crypto.generate_private_key().unwrap();
        let public = crypto.extract_public_key(&private).unwrap();

        let sealed = crypto.encrypt(b"challenge", &public).unwrap();
        assert_eq!(sealed.len(), KEY_LEN + NONCE_LEN + b"challenge".len() + 16);
        assert_eq!(crypto.decrypt(&sealed, &private).unwrap(), b"challenge");

        // 같은 평문이어도 매번 다른 암호문
        let again = crypto.encrypt(b"challenge", &public).unwrap();
        assert_ne!(sealed, again);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let crypto = DalekCrypto::new();
        let alice = crypto.generate_private_key().unwrap();
        let mallory = crypto.generate_private_key().unwrap();
        let sealed = crypto
            .encrypt(b"challenge", &crypto.extract_public_key(&alice).unwrap())
            .unwrap();

        assert!(matches!(
            crypto.decrypt(&sealed, &mallory),
            Err(CryptoError::Decryption)
        ));
        assert!(matches!(
            crypto.decrypt(&sealed[..20], &alice),
            Err(CryptoError::Decryption)
        ));

        let mut tampered = sealed.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(crypto.decrypt(&tampered, &alice).is_err());
    }

    #[test]
    fn test_key_import_export() {
        let crypto = DalekCrypto::new();
        let private = crypto.generate_private_key().unwrap();
        let exported = crypto.export_private_key(&private);
        let imported = crypto.import_private_key(&exported).unwrap();

        let public = crypto.extract_public_key(&private).unwrap();
        assert_eq!(crypto.extract_public_key(&imported).unwrap(), public);

        let public_bytes = crypto.export_public_key(&public);
        assert_eq!(crypto.import_public_key(&public_bytes).unwrap(), public);

        assert!(crypto.import_private_key(&[0u8; 16]).is_err());
        assert!(crypto.import_public_key(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let crypto = DalekCrypto::new();
        let public = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();
        let fingerprint = crypto.fingerprint(&public);
        assert_eq!(fingerprint.len(), 64);
        assert_eq!(fingerprint, crypto.fingerprint(&public.clone()));
    }
}
