use std::collections::HashMap;

use async_trait::async_trait;
use chrono::prelude::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use thiserror::Error;

use vc_trust::did::Document;
use vc_trust::did_resolve::{
    DIDResolver, DocumentMetadata, ResolutionInputMetadata, ResolutionMetadata, ERROR_INVALID_DID,
    ERROR_NOT_FOUND, TYPE_DID_LD_JSON,
};
use vc_trust::jwk::JWK;

pub const DID_MEMORY_PREFIX: &str = "did:memory:";

#[derive(Error, Debug)]
pub enum DIDMemoryError {
    #[error("Invalid DID: {0}")]
    InvalidDID(String),
    #[error("DID not found: {0}")]
    NotFound(String),
    #[error("DID has been deactivated: {0}")]
    Deactivated(String),
    #[error("Key does not control {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

struct Entry {
    document: Document,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    deactivated: bool,
}

/// `did:memory` DID method: documents published to a ledger that lives in
/// the current process.
#[derive(Default)]
pub struct DIDMemory {
    entries: RwLock<HashMap<String, Entry>>,
}

impl DIDMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `did:memory:` followed by the multibase (base58btc) SHA-256 digest of
    /// the public key JWK.
    pub fn generate_did(key: &JWK) -> Result<String, DIDMemoryError> {
        let public_key = serde_json::to_vec(&key.to_public())?;
        let digest = Sha256::digest(&public_key);
        Ok(format!(
            "{}{}",
            DID_MEMORY_PREFIX,
            multibase::encode(multibase::Base::Base58Btc, digest)
        ))
    }

    /// A document for a fresh DID derived from `key`, with `key` published
    /// under `#key_id`.
    pub fn generate_document(
        key: &JWK,
        key_id: &str,
        verification_method_type: &str,
    ) -> Result<Document, DIDMemoryError> {
        let did = Self::generate_did(key)?;
        let mut document = Document::new(&did);
        document.add_verification_method(key_id, verification_method_type, key);
        Ok(document)
    }

    /// Publish or update a document, authorized by `key`. Returns its DID.
    ///
    /// A new DID must be the one derived from `key`. An existing document
    /// can only be replaced with a key published in its current version.
    pub fn publish(&self, document: Document, key: &JWK) -> Result<String, DIDMemoryError> {
        let did = document.id.clone();
        if !did.starts_with(DID_MEMORY_PREFIX) || did.len() == DID_MEMORY_PREFIX.len() {
            return Err(DIDMemoryError::InvalidDID(did));
        }
        let now = Utc::now();
        let mut entries = self.entries.write();
        match entries.get_mut(&did) {
            Some(entry) if entry.deactivated => return Err(DIDMemoryError::Deactivated(did)),
            Some(entry) if !controls(&entry.document, key) => {
                log::warn!("Refused update of {}", did);
                return Err(DIDMemoryError::Unauthorized(did));
            }
            Some(entry) => {
                entry.document = document;
                entry.updated = now;
                log::debug!("Updated {}", did);
            }
            None => {
                if Self::generate_did(key)? != did {
                    log::warn!("Refused to publish {} with a key it is not derived from", did);
                    return Err(DIDMemoryError::Unauthorized(did));
                }
                entries.insert(
                    did.clone(),
                    Entry {
                        document,
                        created: now,
                        updated: now,
                        deactivated: false,
                    },
                );
                log::debug!("Published {}", did);
            }
        }
        Ok(did)
    }

    pub fn deactivate(&self, did: &str) -> Result<(), DIDMemoryError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(did)
            .ok_or_else(|| DIDMemoryError::NotFound(did.to_string()))?;
        entry.deactivated = true;
        entry.updated = Utc::now();
        log::debug!("Deactivated {}", did);
        Ok(())
    }
}

fn controls(document: &Document, key: &JWK) -> bool {
    let public_key = key.to_public();
    document.verification_method.iter().any(|vm| {
        vm.public_key_jwk
            .as_ref()
            .map_or(false, |jwk| jwk.params == public_key.params)
    })
}

#[async_trait]
impl DIDResolver for DIDMemory {
    async fn resolve(
        &self,
        did: &str,
        _input_metadata: &ResolutionInputMetadata,
    ) -> (
        ResolutionMetadata,
        Option<Document>,
        Option<DocumentMetadata>,
    ) {
        if !did.starts_with(DID_MEMORY_PREFIX) {
            return (ResolutionMetadata::from_error(ERROR_INVALID_DID), None, None);
        }
        let entries = self.entries.read();
        let entry = match entries.get(did) {
            Some(entry) => entry,
            None => return (ResolutionMetadata::from_error(ERROR_NOT_FOUND), None, None),
        };
        (
            ResolutionMetadata {
                error: None,
                content_type: Some(TYPE_DID_LD_JSON.to_string()),
            },
            Some(entry.document.clone()),
            Some(DocumentMetadata {
                created: Some(entry.created),
                updated: Some(entry.updated),
                deactivated: Some(entry.deactivated),
                property_set: HashMap::new(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_trust::did_resolve::resolve_document;

    fn key() -> JWK {
        serde_json::from_value(serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "G80iskrv_nE69qbGLSpeOHJgmV4MKIzsy5l5iT6pCww",
            "d": "39Ev8-k-jkKunJyFWog3k0OwgPjnKv_qwLhfqXdAXTY"
        }))
        .unwrap()
    }

    /// Ed25519 key from RFC 8037 appendix A.
    fn other_key() -> JWK {
        serde_json::from_value(serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
            "d": "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A"
        }))
        .unwrap()
    }

    #[test]
    fn generate_did() {
        let did = DIDMemory::generate_did(&key()).unwrap();
        assert!(did.starts_with("did:memory:z"));
        // Only the public part of the key contributes.
        assert_eq!(did, DIDMemory::generate_did(&key().to_public()).unwrap());
    }

    #[async_std::test]
    async fn publish_and_resolve() {
        let ledger = DIDMemory::new();
        let doc = DIDMemory::generate_document(&key(), "keys-1", "Ed25519VerificationKey2018")
            .unwrap();
        let did = ledger.publish(doc.clone(), &key()).unwrap();
        let (res_meta, resolved, doc_meta) = ledger
            .resolve(&did, &ResolutionInputMetadata::default())
            .await;
        assert!(res_meta.error.is_none());
        assert_eq!(resolved.unwrap(), doc);
        assert_eq!(doc_meta.unwrap().deactivated, Some(false));
        assert!(doc.select_verification_method("keys-1").is_some());
    }

    #[async_std::test]
    async fn resolve_errors() {
        let ledger = DIDMemory::new();
        let (res_meta, doc, _) = ledger
            .resolve("did:example:foo", &ResolutionInputMetadata::default())
            .await;
        assert_eq!(res_meta.error.as_deref(), Some(ERROR_INVALID_DID));
        assert!(doc.is_none());
        let (res_meta, _, _) = ledger
            .resolve("did:memory:zNope", &ResolutionInputMetadata::default())
            .await;
        assert_eq!(res_meta.error.as_deref(), Some(ERROR_NOT_FOUND));
    }

    #[async_std::test]
    async fn deactivate() {
        let ledger = DIDMemory::new();
        let doc = DIDMemory::generate_document(&key(), "keys-1", "Ed25519VerificationKey2018")
            .unwrap();
        let did = ledger.publish(doc.clone(), &key()).unwrap();
        ledger.deactivate(&did).unwrap();
        resolve_document(&ledger, &did, None).await.unwrap_err();
        assert!(matches!(
            ledger.publish(doc, &key()),
            Err(DIDMemoryError::Deactivated(_))
        ));
        assert!(matches!(
            ledger.deactivate("did:memory:zNope"),
            Err(DIDMemoryError::NotFound(_))
        ));
    }

    #[async_std::test]
    async fn update_requires_control() {
        let ledger = DIDMemory::new();
        let doc = DIDMemory::generate_document(&key(), "keys-1", "Ed25519VerificationKey2018")
            .unwrap();
        let did = ledger.publish(doc.clone(), &key()).unwrap();

        let mut hijacked = Document::new(&did);
        hijacked.add_verification_method("keys-1", "Ed25519VerificationKey2018", &other_key());
        assert!(matches!(
            ledger.publish(hijacked, &other_key()),
            Err(DIDMemoryError::Unauthorized(_))
        ));
        let resolved = resolve_document(&ledger, &did, None).await.unwrap();
        assert_eq!(resolved, doc);

        // The owner rotates to the other key, which then controls the DID.
        let mut rotated = Document::new(&did);
        rotated.add_verification_method("keys-2", "Ed25519VerificationKey2018", &other_key());
        ledger.publish(rotated.clone(), &key()).unwrap();
        assert_eq!(resolve_document(&ledger, &did, None).await.unwrap(), rotated);
        assert!(matches!(
            ledger.publish(doc.clone(), &key()),
            Err(DIDMemoryError::Unauthorized(_))
        ));
        ledger.publish(doc, &other_key()).unwrap();
    }

    #[test]
    fn publish_requires_derived_did() {
        let ledger = DIDMemory::new();
        let doc = DIDMemory::generate_document(&key(), "keys-1", "Ed25519VerificationKey2018")
            .unwrap();
        assert!(matches!(
            ledger.publish(doc, &other_key()),
            Err(DIDMemoryError::Unauthorized(_))
        ));
    }

    #[test]
    fn publish_foreign_did() {
        let ledger = DIDMemory::new();
        assert!(matches!(
            ledger.publish(Document::new("did:example:foo"), &key()),
            Err(DIDMemoryError::InvalidDID(_))
        ));
    }
}
