//! Local signing identity backed by an in-process Ed25519 key.

use crate::ports::outbound::{ConfigSigner, SigningError};
use async_trait::async_trait;
use shared_crypto::Ed25519KeyPair;
use shared_types::{IdentityRole, SerializedIdentity};

pub struct LocalSigner {
    keypair: Ed25519KeyPair,
    identity: SerializedIdentity,
}

impl LocalSigner {
    pub fn new(org: impl Into<String>, role: IdentityRole, keypair: Ed25519KeyPair) -> Self {
        let identity = SerializedIdentity::new(org, role, keypair.public_key().as_bytes().to_vec());
        Self { keypair, identity }
    }

    /// Fresh random key.
    pub fn generate(org: impl Into<String>, role: IdentityRole) -> Self {
        Self::new(org, role, Ed25519KeyPair::generate())
    }

    /// Deterministic key derived from `org` and `label`, for fixtures.
    pub fn from_label(org: &str, role: IdentityRole, label: &str) -> Self {
        let keypair = Ed25519KeyPair::from_label(&format!("{}/{}/{}", org, role, label));
        Self::new(org, role, keypair)
    }
}

#[async_trait]
impl ConfigSigner for LocalSigner {
    fn identity(&self) -> &SerializedIdentity {
        &self.identity
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        Ok(self.keypair.sign(payload).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signature_verifies_with_identity_key() {
        let signer = LocalSigner::generate("Org1", IdentityRole::Admin);
        let sig = signer.sign(b"config").await.unwrap();
        shared_crypto::verify_detached(&signer.identity().public_key, b"config", &sig).unwrap();
    }

    #[test]
    fn test_labels_are_scoped_by_org() {
        let a = LocalSigner::from_label("Org1", IdentityRole::Admin, "admin");
        let b = LocalSigner::from_label("Org2", IdentityRole::Admin, "admin");
        let a2 = LocalSigner::from_label("Org1", IdentityRole::Admin, "admin");
        assert_ne!(a.identity().public_key, b.identity().public_key);
        assert_eq!(a.identity(), a2.identity());
    }
}
