//! AES-256-GCM encryption for social access tokens at rest.
//!
//! Encrypted format: `nonce (12 bytes) || ciphertext`, hex-encoded for
//! storage in a TEXT column. The master key lives in `{data_dir}/vault.key`
//! (64 hex chars) and is generated on first use.
//!
//! Error types never contain plaintext or key material.

use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use thiserror::Error;

const NONCE_SIZE: usize = 12;

/// File name of the master key inside the data directory.
pub const KEY_FILE: &str = "vault.key";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("invalid ciphertext encoding")]
    InvalidEncoding,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("key file error: {0}")]
    KeyFile(String),
}

/// Symmetric cipher for access tokens.
///
/// Each encryption uses a fresh random nonce, so the same token encrypts to
/// different ciphertexts.
#[derive(Clone)]
pub struct TokenVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}

impl TokenVault {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Derive the key from a passphrase with Argon2id (19 MiB, 2 passes).
    ///
    /// The salt is fixed so the same passphrase always yields the same key;
    /// the passphrase is the only secret.
    pub fn from_password(password: &str) -> Result<Self, VaultError> {
        use argon2::{Algorithm, Argon2, Params, Version};

        let params = Params::new(19456, 2, 1, Some(32)).map_err(|_| VaultError::KeyDerivationFailed)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; 32];
        argon2
            .hash_password_into(password.as_bytes(), b"socialdesk-vault-v1", &mut key)
            .map_err(|_| VaultError::KeyDerivationFailed)?;
        Ok(Self::new(&key))
    }

    /// Load the master key from `path`, generating and writing a new random
    /// key when the file does not exist.
    pub fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let bytes = hex_decode(contents.trim())
                    .map_err(|_| VaultError::KeyFile("corrupted key file".to_string()))?;
                let key: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| VaultError::KeyFile("invalid key length".to_string()))?;
                Ok(Self::new(&key))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = rand_bytes();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| VaultError::KeyFile(e.to_string()))?;
                }
                std::fs::write(path, hex_encode(&key)).map_err(|e| VaultError::KeyFile(e.to_string()))?;
                restrict_permissions(path)?;
                tracing::info!(path = %path.display(), "generated new vault key");
                Ok(Self::new(&key))
            }
            Err(e) => Err(VaultError::KeyFile(e.to_string())),
        }
    }

    /// Key file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> Result<Self, VaultError> {
        Self::from_key_file(&data_dir.join(KEY_FILE))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, VaultError> {
        if data.len() < NONCE_SIZE {
            return Err(VaultError::CiphertextTooShort);
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)
    }

    /// Encrypt a token into hex text for a database column.
    pub fn seal(&self, token: &str) -> Result<String, VaultError> {
        Ok(hex_encode(&self.encrypt(token.as_bytes())?))
    }

    /// Reverse of [`seal`](Self::seal).
    pub fn open(&self, sealed: &str) -> Result<String, VaultError> {
        let data = hex_decode(sealed).map_err(|_| VaultError::InvalidEncoding)?;
        let plain = self.decrypt(&data)?;
        String::from_utf8(plain).map_err(|_| VaultError::InvalidEncoding)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), VaultError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| VaultError::KeyFile(e.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), VaultError> {
    Ok(())
}

/// 32 random bytes from the OS CSPRNG.
pub(crate) fn rand_bytes() -> [u8; 32] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err("invalid hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let vault = TokenVault::new(&test_key());
        let sealed = vault.seal("EAAG-long-lived-token").unwrap();
        assert!(!sealed.contains("EAAG"));
        assert_eq!(vault.open(&sealed).unwrap(), "EAAG-long-lived-token");
    }

    #[test]
    fn test_random_nonce_produces_different_ciphertexts() {
        let vault = TokenVault::new(&test_key());
        let a = vault.seal("same").unwrap();
        let b = vault.seal("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(vault.open(&a).unwrap(), vault.open(&b).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = TokenVault::new(&test_key()).seal("secret").unwrap();
        let mut wrong = test_key();
        wrong[0] = 0xFF;
        let err = TokenVault::new(&wrong).open(&sealed).unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailed));
    }

    #[test]
    fn test_malformed_input() {
        let vault = TokenVault::new(&test_key());
        assert!(matches!(vault.decrypt(&[0u8; 5]).unwrap_err(), VaultError::CiphertextTooShort));
        assert!(matches!(vault.open("zz").unwrap_err(), VaultError::InvalidEncoding));
    }

    #[test]
    fn test_key_file_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = TokenVault::open_in(dir.path()).unwrap();
        let sealed = first.seal("token").unwrap();

        let contents = std::fs::read_to_string(dir.path().join(KEY_FILE)).unwrap();
        assert_eq!(contents.len(), 64);

        let second = TokenVault::open_in(dir.path()).unwrap();
        assert_eq!(second.open(&sealed).unwrap(), "token");
    }

    #[test]
    fn test_corrupted_key_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KEY_FILE), "abcd").unwrap();
        assert!(matches!(TokenVault::open_in(dir.path()).unwrap_err(), VaultError::KeyFile(_)));
    }

    #[test]
    fn test_from_password_is_deterministic() {
        let a = TokenVault::from_password("correct horse").unwrap();
        let b = TokenVault::from_password("correct horse").unwrap();
        let sealed = a.seal("token").unwrap();
        assert_eq!(b.open(&sealed).unwrap(), "token");
    }

    #[test]
    fn test_hex_roundtrip() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0xFF];
        assert_eq!(hex_encode(&bytes), "deadbeef00ff");
        assert_eq!(hex_decode("deadbeef00ff").unwrap(), bytes);
    }
}
