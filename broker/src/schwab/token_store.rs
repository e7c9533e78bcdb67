//! Encrypted on-disk token persistence.
//!
//! The file holds `{version, nonce, ciphertext}` JSON; the ciphertext is the
//! serialized [`Token`] sealed with ChaCha20-Poly1305 under a 32-byte key.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use log::debug;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use super::types::Token;
use crate::error::BrokerError;

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct EncryptedToken {
    version: u32,
    nonce: String,
    ciphertext: String,
}

/// Reads and writes the encrypted token file.
pub struct TokenStore {
    path: PathBuf,
    key: [u8; 32],
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl TokenStore {
    /// `raw_key` is base64 or a 32-character ASCII string.
    pub fn new(path: impl Into<PathBuf>, raw_key: &str) -> Result<Self, BrokerError> {
        Ok(Self {
            path: path.into(),
            key: decode_key(raw_key)?,
        })
    }

    /// Read the key from environment variable `key_env`.
    pub fn from_env(path: impl Into<PathBuf>, key_env: &str) -> Result<Self, BrokerError> {
        let raw = std::env::var(key_env)
            .map_err(|_| BrokerError::Token(format!("{key_env} must be set to encrypt the token file")))?;
        Self::new(path, &raw)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token, or `None` if no token has been saved yet.
    pub fn load(&self) -> Result<Option<Token>, BrokerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&self.path).map_err(|e| self.io_error("read", e))?;
        if raw.is_empty() {
            return Ok(None);
        }

        let enc: EncryptedToken = serde_json::from_slice(&raw)
            .map_err(|e| BrokerError::Token(format!("malformed token file: {e}")))?;
        if enc.version != CURRENT_VERSION {
            return Err(BrokerError::Token(format!(
                "unsupported token file version {}",
                enc.version
            )));
        }
        let nonce_bytes = BASE64
            .decode(enc.nonce)
            .map_err(|e| BrokerError::Token(format!("failed to decode nonce: {e}")))?;
        if nonce_bytes.len() != 12 {
            return Err(BrokerError::Token("nonce must be 12 bytes".into()));
        }
        let cipher_bytes = BASE64
            .decode(enc.ciphertext)
            .map_err(|e| BrokerError::Token(format!("failed to decode ciphertext: {e}")))?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), cipher_bytes.as_ref())
            .map_err(|_| BrokerError::Token("failed to decrypt token file (wrong key?)".into()))?;

        let token = serde_json::from_slice(&plaintext)
            .map_err(|e| BrokerError::Token(format!("malformed token: {e}")))?;
        Ok(Some(token))
    }

    /// Encrypt and write `token`, replacing any previous one.
    pub fn save(&self, token: &Token) -> Result<(), BrokerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error("create dir for", e))?;
            }
        }

        let serialized = serde_json::to_vec(token)
            .map_err(|e| BrokerError::Token(format!("failed to serialize token: {e}")))?;
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), serialized.as_ref())
            .map_err(|_| BrokerError::Token("failed to encrypt token".into()))?;

        let enc = EncryptedToken {
            version: CURRENT_VERSION,
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        };
        let json = serde_json::to_string_pretty(&enc)
            .map_err(|e| BrokerError::Token(format!("failed to serialize token file: {e}")))?;
        fs::write(&self.path, json).map_err(|e| self.io_error("write", e))?;
        restrict_permissions(&self.path).map_err(|e| self.io_error("chmod", e))?;

        debug!("Token saved to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> BrokerError {
        BrokerError::Token(format!("failed to {action} {}: {e}", self.path.display()))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn decode_key(raw: &str) -> Result<[u8; 32], BrokerError> {
    let trimmed = raw.trim();
    // A 32-character ASCII key can also be valid base64 of 24 bytes
    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) if bytes.len() == 32 => bytes,
        _ if trimmed.len() == 32 => trimmed.as_bytes().to_vec(),
        Ok(_) => {
            return Err(BrokerError::Token(
                "token key must decode to exactly 32 bytes".into(),
            ));
        }
        Err(_) => {
            return Err(BrokerError::Token(
                "token key must be a base64 string or 32-byte ascii value".into(),
            ));
        }
    };

    <[u8; 32]>::try_from(decoded.as_slice())
        .map_err(|_| BrokerError::Token("token key must be exactly 32 bytes".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn token() -> Token {
        Token {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            token_type: "Bearer".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"), KEY).unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save(&token()).unwrap();
        assert_eq!(store.load().unwrap(), Some(token()));
    }

    #[test]
    fn file_does_not_contain_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store = TokenStore::new(&path, KEY).unwrap();
        store.save(&token()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("ciphertext"));
        assert!(!raw.contains("refresh"));
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        TokenStore::new(&path, KEY).unwrap().save(&token()).unwrap();

        let other = TokenStore::new(&path, "ffffffffffffffffffffffffffffffff").unwrap();
        assert!(matches!(other.load(), Err(BrokerError::Token(_))));
    }

    #[test]
    fn base64_key_accepted() {
        let key = BASE64.encode([7u8; 32]);
        assert!(TokenStore::new("t.json", &key).is_ok());
    }

    #[test]
    fn short_key_rejected() {
        assert!(TokenStore::new("t.json", "tooshort").is_err());
        assert!(TokenStore::new("t.json", &BASE64.encode([1u8; 16])).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        TokenStore::new(&path, KEY).unwrap().save(&token()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
