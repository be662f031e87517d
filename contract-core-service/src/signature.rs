use async_trait::async_trait;
use contract_core_api::{ContractError, ContractResult, SignatureValidator, SigningMessage};
use ed25519_dalek::{Signature, VerifyingKey};
use std::collections::HashMap;
use uuid::Uuid;

/// BLAKE3 digest of contract content, hex encoded.
pub fn content_digest(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Hash commitment over the signing message.
///
/// Anyone who knows the message can produce the commitment, so this proves
/// intent only together with an authenticated caller. Use it in tests and
/// single-tenant deployments; `Ed25519SignatureValidator` is the real check.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashSignatureValidator;

impl HashSignatureValidator {
    /// The commitment a client submits for `message`.
    pub fn commitment(message: &SigningMessage) -> String {
        blake3::hash(&message.to_bytes()).to_hex().to_string()
    }
}

#[async_trait]
impl SignatureValidator for HashSignatureValidator {
    async fn validate(&self, message: &SigningMessage, signature_data: &str) -> ContractResult<bool> {
        let Ok(submitted) = blake3::Hash::from_hex(signature_data) else {
            return Ok(false);
        };
        // blake3::Hash equality is constant time
        Ok(submitted == blake3::hash(&message.to_bytes()))
    }
}

/// Looks up the public key a signer registered.
#[async_trait]
pub trait SignerKeyResolver: Send + Sync {
    async fn resolve(&self, signer_id: Uuid) -> ContractResult<Option<VerifyingKey>>;
}

/// Fixed key set, loaded at start-up.
#[derive(Debug, Default, Clone)]
pub struct StaticKeyRing {
    keys: HashMap<Uuid, VerifyingKey>,
}

impl StaticKeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, signer_id: Uuid, key: VerifyingKey) -> Self {
        self.keys.insert(signer_id, key);
        self
    }

    /// Adds a key given as 32 hex-encoded bytes.
    pub fn with_hex_key(self, signer_id: Uuid, key_hex: &str) -> ContractResult<Self> {
        let bytes: [u8; 32] = hex::decode(key_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| ContractError::ValidationError("verifying key must be 32 hex-encoded bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ContractError::ValidationError(format!("invalid verifying key: {e}")))?;
        Ok(self.with_key(signer_id, key))
    }
}

#[async_trait]
impl SignerKeyResolver for StaticKeyRing {
    async fn resolve(&self, signer_id: Uuid) -> ContractResult<Option<VerifyingKey>> {
        Ok(self.keys.get(&signer_id).copied())
    }
}

/// Ed25519 signature over `SigningMessage::to_bytes`, submitted as 64 hex-encoded bytes.
pub struct Ed25519SignatureValidator<R> {
    resolver: R,
}

impl<R: SignerKeyResolver> Ed25519SignatureValidator<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl<R: SignerKeyResolver> SignatureValidator for Ed25519SignatureValidator<R> {
    async fn validate(&self, message: &SigningMessage, signature_data: &str) -> ContractResult<bool> {
        let key = self.resolver.resolve(message.signer_id).await?.ok_or_else(|| {
            ContractError::SignatureInvalid(format!(
                "no verifying key registered for signer {}",
                message.signer_id
            ))
        })?;

        let Ok(bytes) = hex::decode(signature_data) else {
            return Ok(false);
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return Ok(false);
        };

        Ok(key.verify_strict(&message.to_bytes(), &signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn message(signer_id: Uuid) -> SigningMessage {
        SigningMessage::new(Uuid::new_v4(), signer_id, content_digest("terms"))
    }

    #[tokio::test]
    async fn test_hash_commitment() {
        let msg = message(Uuid::new_v4());
        let commitment = HashSignatureValidator::commitment(&msg);

        assert!(HashSignatureValidator.validate(&msg, &commitment).await.unwrap());
        assert!(!HashSignatureValidator.validate(&msg, "not-hex").await.unwrap());

        let other = message(msg.signer_id);
        assert!(!HashSignatureValidator.validate(&other, &commitment).await.unwrap());
    }

    #[test]
    fn test_content_digest_changes_with_content() {
        assert_eq!(content_digest("a"), content_digest("a"));
        assert_ne!(content_digest("a"), content_digest("b"));
        assert_eq!(content_digest("a").len(), 64);
    }

    #[tokio::test]
    async fn test_ed25519_signature() {
        let signer_id = Uuid::new_v4();
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let ring = StaticKeyRing::new().with_key(signer_id, signing_key.verifying_key());
        let validator = Ed25519SignatureValidator::new(ring);

        let msg = message(signer_id);
        let signature = hex::encode(signing_key.sign(&msg.to_bytes()).to_bytes());

        assert!(validator.validate(&msg, &signature).await.unwrap());

        let tampered = SigningMessage::new(msg.contract_id, signer_id, content_digest("other terms"));
        assert!(!validator.validate(&tampered, &signature).await.unwrap());
        assert!(!validator.validate(&msg, "zz").await.unwrap());
    }

    #[tokio::test]
    async fn test_ed25519_unknown_signer() {
        let validator = Ed25519SignatureValidator::new(StaticKeyRing::new());
        let err = validator
            .validate(&message(Uuid::new_v4()), "00")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SIGNATURE_INVALID");
    }

    #[test]
    fn test_hex_key_loading() {
        let key = SigningKey::from_bytes(&[9u8; 32]).verifying_key();
        let ring = StaticKeyRing::new().with_hex_key(Uuid::new_v4(), &hex::encode(key.to_bytes()));
        assert!(ring.is_ok());
        assert!(StaticKeyRing::new().with_hex_key(Uuid::new_v4(), "abcd").is_err());
    }
}
