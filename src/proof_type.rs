use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::did::{Document, VerificationMethodRef};
use crate::error::Error;
use crate::proof::Proof;
use crate::suites::ProofSuite;

/// Inputs to a [`ProofBuildingMethod`].
#[derive(Debug, Clone)]
pub struct ProofBuildOptions {
    /// DID document of the signer.
    pub issuer: Document,
    /// Key id of the signing key within `issuer`.
    pub key_id: String,
    pub challenge_nonce: Option<String>,
}

/// Builds an unsigned [`Proof`] for a signer.
pub type ProofBuildingMethod = Arc<dyn Fn(ProofBuildOptions) -> Result<Proof, Error> + Send + Sync>;

/// Builder used for the registered suites: checks that the signing key is
/// published in the signer's document with a type the suite accepts.
pub fn default_builder(suite: Arc<dyn ProofSuite>) -> ProofBuildingMethod {
    Arc::new(move |options: ProofBuildOptions| -> Result<Proof, Error> {
        let vm = options
            .issuer
            .select_verification_method(&options.key_id)
            .ok_or_else(|| {
                Error::KeyNotFound(
                    VerificationMethodRef::new(&options.issuer.id, &options.key_id).to_string(),
                )
            })?;
        if !suite
            .verification_method_types()
            .contains(&vm.type_.as_str())
        {
            return Err(Error::UnsupportedKeyType(vm.type_.clone()));
        }
        Ok(Proof::new(
            suite.clone(),
            VerificationMethodRef::new(&options.issuer.id, &options.key_id),
            options.challenge_nonce,
        ))
    })
}

struct ProofType {
    builder: ProofBuildingMethod,
    suite: Arc<dyn ProofSuite>,
}

lazy_static::lazy_static! {
    static ref PROOF_TYPE_MANAGER: ProofTypeManager = ProofTypeManager::new();
}

/// Registry of proof types by name.
pub struct ProofTypeManager {
    proof_types: RwLock<HashMap<String, ProofType>>,
}

impl Default for ProofTypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProofTypeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofTypeManager")
            .field("proof_types", &self.get_proof_type_names())
            .finish()
    }
}

impl ProofTypeManager {
    /// A registry holding the suites enabled by cargo features.
    pub fn new() -> Self {
        let manager = Self::empty();
        let mut builtins: Vec<Arc<dyn ProofSuite>> = Vec::new();
        #[cfg(feature = "rsa")]
        builtins.push(Arc::new(crate::suites::RsaSignature2018));
        #[cfg(feature = "ed25519")]
        builtins.push(Arc::new(crate::suites::Ed25519Signature2018));
        {
            let mut proof_types = manager.proof_types.write();
            for suite in builtins {
                proof_types.insert(
                    suite.proof_type().to_string(),
                    ProofType {
                        builder: default_builder(suite.clone()),
                        suite,
                    },
                );
            }
        }
        manager
    }

    /// A registry without any proof type.
    pub fn empty() -> Self {
        Self {
            proof_types: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry.
    pub fn instance() -> &'static ProofTypeManager {
        &PROOF_TYPE_MANAGER
    }

    /// Register `suite` under `name`. `name` must be the suite's proof type.
    pub fn register_proof_type(
        &self,
        name: &str,
        builder: ProofBuildingMethod,
        suite: Arc<dyn ProofSuite>,
    ) -> Result<(), Error> {
        if name != suite.proof_type() {
            return Err(Error::ProofTypeMismatch {
                name: name.to_string(),
                proof_type: suite.proof_type().to_string(),
            });
        }
        let mut proof_types = self.proof_types.write();
        if proof_types.contains_key(name) {
            return Err(Error::ProofTypeAlreadyRegistered(name.to_string()));
        }
        proof_types.insert(name.to_string(), ProofType { builder, suite });
        log::debug!("Registered proof type {}", name);
        Ok(())
    }

    pub fn get_proof_builder(&self, name: &str) -> Result<ProofBuildingMethod, Error> {
        self.proof_types
            .read()
            .get(name)
            .map(|proof_type| proof_type.builder.clone())
            .ok_or_else(|| Error::ProofTypeNotFound(name.to_string()))
    }

    pub fn get_proof_suite(&self, name: &str) -> Result<Arc<dyn ProofSuite>, Error> {
        self.proof_types
            .read()
            .get(name)
            .map(|proof_type| proof_type.suite.clone())
            .ok_or_else(|| Error::ProofTypeNotFound(name.to_string()))
    }

    pub fn get_proof_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.proof_types.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create_proof_with_builder(
        &self,
        name: &str,
        options: ProofBuildOptions,
    ) -> Result<Proof, Error> {
        let builder = self.get_proof_builder(name)?;
        let proof = builder(options)?;
        if proof.proof_type() != name {
            return Err(Error::ProofTypeMismatch {
                name: name.to_string(),
                proof_type: proof.proof_type().to_string(),
            });
        }
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::JWK;

    struct NullSuite;

    impl ProofSuite for NullSuite {
        fn proof_type(&self) -> &'static str {
            "NullSignature"
        }

        fn verification_method_types(&self) -> &'static [&'static str] {
            &["NullKey"]
        }

        fn sign(&self, data: &[u8], _key: &JWK) -> Result<Vec<u8>, Error> {
            Ok(data.to_vec())
        }

        fn verify(&self, data: &[u8], signature: &[u8], _key: &JWK) -> Result<(), Error> {
            if data == signature {
                Ok(())
            } else {
                Err(Error::InvalidSignature)
            }
        }
    }

    struct OtherSuite;

    impl ProofSuite for OtherSuite {
        fn proof_type(&self) -> &'static str {
            "OtherSignature"
        }

        fn verification_method_types(&self) -> &'static [&'static str] {
            &["NullKey"]
        }

        fn sign(&self, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error> {
            NullSuite.sign(data, key)
        }

        fn verify(&self, data: &[u8], signature: &[u8], key: &JWK) -> Result<(), Error> {
            NullSuite.verify(data, signature, key)
        }
    }

    fn null_options() -> ProofBuildOptions {
        let mut doc = Document::new("did:example:issuer");
        doc.add_verification_method("keys-1", "NullKey", &crate::jwk::tests::rsa_test_key());
        ProofBuildOptions {
            issuer: doc,
            key_id: "keys-1".to_string(),
            challenge_nonce: None,
        }
    }

    #[cfg(feature = "ed25519")]
    fn issuer() -> (Document, JWK) {
        let key = JWK::ed25519_from_secret(&[5u8; 32]);
        let mut doc = Document::new("did:example:issuer");
        doc.add_verification_method(
            "keys-1",
            crate::suites::ED25519_VERIFICATION_KEY_2018,
            &key,
        );
        (doc, key)
    }

    #[test]
    fn builtin_proof_types() {
        let manager = ProofTypeManager::new();
        let names = manager.get_proof_type_names();
        #[cfg(feature = "rsa")]
        assert!(names.contains(&"RsaSignature2018".to_string()));
        #[cfg(feature = "ed25519")]
        assert!(names.contains(&"Ed25519Signature2018".to_string()));
        assert!(ProofTypeManager::empty().get_proof_type_names().is_empty());
    }

    #[test]
    fn unknown_proof_type() {
        let manager = ProofTypeManager::new();
        assert!(matches!(
            manager.get_proof_builder("Unknown"),
            Err(Error::ProofTypeNotFound(_))
        ));
        assert!(matches!(
            manager.get_proof_suite("Unknown"),
            Err(Error::ProofTypeNotFound(_))
        ));
    }

    #[test]
    fn register_proof_type() {
        let manager = ProofTypeManager::empty();
        let suite: Arc<dyn ProofSuite> = Arc::new(NullSuite);
        manager
            .register_proof_type("NullSignature", default_builder(suite.clone()), suite.clone())
            .unwrap();
        let err = manager
            .register_proof_type("NullSignature", default_builder(suite.clone()), suite)
            .unwrap_err();
        assert!(matches!(err, Error::ProofTypeAlreadyRegistered(_)));
        assert_eq!(
            manager.get_proof_suite("NullSignature").unwrap().proof_type(),
            "NullSignature"
        );
    }

    #[test]
    fn register_under_another_name() {
        let manager = ProofTypeManager::empty();
        let suite: Arc<dyn ProofSuite> = Arc::new(NullSuite);
        let err = manager
            .register_proof_type("AliasSignature2024", default_builder(suite.clone()), suite)
            .unwrap_err();
        assert!(matches!(err, Error::ProofTypeMismatch { .. }));
        assert!(manager.get_proof_type_names().is_empty());
    }

    #[test]
    fn builder_must_match_registered_type() {
        let manager = ProofTypeManager::empty();
        let suite: Arc<dyn ProofSuite> = Arc::new(NullSuite);
        let other: Arc<dyn ProofSuite> = Arc::new(OtherSuite);
        manager
            .register_proof_type("NullSignature", default_builder(other), suite)
            .unwrap();
        let err = manager
            .create_proof_with_builder("NullSignature", null_options())
            .unwrap_err();
        assert!(matches!(err, Error::ProofTypeMismatch { .. }));
    }

    #[test]
    fn registered_proof_type_round_trip() {
        let manager = ProofTypeManager::empty();
        let suite: Arc<dyn ProofSuite> = Arc::new(NullSuite);
        manager
            .register_proof_type("NullSignature", default_builder(suite.clone()), suite)
            .unwrap();
        let key = crate::jwk::tests::rsa_test_key();
        let document = serde_json::json!({"hello": "world"});
        let mut proof = manager
            .create_proof_with_builder("NullSignature", null_options())
            .unwrap();
        proof.sign(&document, &key).unwrap();

        let encoded = proof.encode_to_json();
        assert_eq!(encoded["type"], "NullSignature");
        let decoded = Proof::decode_from_json(&encoded, &manager).unwrap();
        assert_eq!(decoded, proof);
        assert!(decoded.verify(&document, &key));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn create_proof() {
        let manager = ProofTypeManager::new();
        let (doc, _key) = issuer();
        let proof = manager
            .create_proof_with_builder(
                "Ed25519Signature2018",
                ProofBuildOptions {
                    issuer: doc,
                    key_id: "keys-1".to_string(),
                    challenge_nonce: Some("nonce".to_string()),
                },
            )
            .unwrap();
        assert!(!proof.is_signed());
        assert_eq!(proof.proof_type(), "Ed25519Signature2018");
        assert_eq!(
            proof.verification_method().to_string(),
            "did:example:issuer#keys-1"
        );
        assert_eq!(proof.challenge_nonce(), Some("nonce"));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn create_proof_unknown_key() {
        let manager = ProofTypeManager::new();
        let (doc, _key) = issuer();
        let err = manager
            .create_proof_with_builder(
                "Ed25519Signature2018",
                ProofBuildOptions {
                    issuer: doc,
                    key_id: "keys-2".to_string(),
                    challenge_nonce: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    #[cfg(all(feature = "rsa", feature = "ed25519"))]
    fn create_proof_wrong_key_type() {
        let manager = ProofTypeManager::new();
        let (doc, _key) = issuer();
        let err = manager
            .create_proof_with_builder(
                "RsaSignature2018",
                ProofBuildOptions {
                    issuer: doc,
                    key_id: "keys-1".to_string(),
                    challenge_nonce: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedKeyType(_)));
    }

    #[test]
    fn instance_is_shared() {
        assert!(std::ptr::eq(
            ProofTypeManager::instance(),
            ProofTypeManager::instance()
        ));
    }
}
