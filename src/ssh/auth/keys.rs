//! Private key files
//!
//! Loads OpenSSH/PEM private keys offered during public key authentication.

use crate::error::{Error, Result};
use russh::keys::{HashAlg, PrivateKey, PublicKey};
use std::path::Path;

/// Load an unencrypted private key from a file
pub fn load_private_key(path: &Path) -> Result<PrivateKey> {
    let key_data = std::fs::read_to_string(path).map_err(|e| Error::KeyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_private_key(&key_data).map_err(|reason| Error::KeyLoad {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse a private key from its PEM/OpenSSH text
pub fn parse_private_key(pem_data: &str) -> std::result::Result<PrivateKey, String> {
    russh::keys::decode_secret_key(pem_data, None).map_err(|e| e.to_string())
}

/// SHA256 fingerprint of a public key, e.g. `SHA256:Xx...`
pub fn key_fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use russh::keys::ssh_key::private::Ed25519Keypair;
    use russh::keys::ssh_key::LineEnding;

    fn generate_ed25519_key() -> PrivateKey {
        PrivateKey::from(Ed25519Keypair::random(&mut OsRng))
    }

    #[test]
    fn test_key_fingerprint_format() {
        let key = generate_ed25519_key();
        let fp = key_fingerprint(key.public_key());
        assert!(fp.starts_with("SHA256:"));
    }

    #[test]
    fn test_load_private_key() {
        let key = generate_ed25519_key();
        let openssh = key.to_openssh(LineEnding::LF).unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let key_path = temp_dir.path().join("id_ed25519");
        std::fs::write(&key_path, openssh.as_bytes()).unwrap();

        let loaded = load_private_key(&key_path).unwrap();
        assert_eq!(
            key_fingerprint(key.public_key()),
            key_fingerprint(loaded.public_key())
        );
    }

    #[test]
    fn test_load_private_key_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let key_path = temp_dir.path().join("does_not_exist");

        match load_private_key(&key_path) {
            Err(Error::KeyLoad { path, .. }) => assert_eq!(path, key_path),
            other => panic!("Expected KeyLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_private_key_garbage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let key_path = temp_dir.path().join("id_broken");
        std::fs::write(&key_path, "not a private key").unwrap();

        let err = load_private_key(&key_path).unwrap_err();
        assert!(matches!(err, Error::KeyLoad { .. }));
    }
}
