use std::sync::Arc;

use chrono::prelude::{DateTime, Utc};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::did::VerificationMethodRef;
use crate::error::Error;
use crate::jwk::JWK;
use crate::proof_type::ProofTypeManager;
use crate::suites::ProofSuite;

/// Wire form of a [`Proof`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofDocument {
    #[serde(rename = "type")]
    pub type_: String,
    pub verification_method: String,
    /// RFC 3339 timestamp, carried verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_value: Option<String>,
}

/// A signature over a JSON document, made with a key of a DID document.
#[derive(Clone)]
pub struct Proof {
    suite: Arc<dyn ProofSuite>,
    verification_method: VerificationMethodRef,
    created: Option<String>,
    challenge_nonce: Option<String>,
    signature_value: Option<Vec<u8>>,
}

impl std::fmt::Debug for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proof")
            .field("type", &self.suite.proof_type())
            .field("verification_method", &self.verification_method)
            .field("created", &self.created)
            .field("challenge_nonce", &self.challenge_nonce)
            .field("signature_value", &self.signature_value)
            .finish()
    }
}

impl PartialEq for Proof {
    fn eq(&self, other: &Self) -> bool {
        self.proof_type() == other.proof_type()
            && self.verification_method == other.verification_method
            && self.created == other.created
            && self.challenge_nonce == other.challenge_nonce
            && self.signature_value == other.signature_value
    }
}

impl Proof {
    /// An unsigned proof.
    pub fn new(
        suite: Arc<dyn ProofSuite>,
        verification_method: VerificationMethodRef,
        challenge_nonce: Option<String>,
    ) -> Self {
        Self {
            suite,
            verification_method,
            created: None,
            challenge_nonce,
            signature_value: None,
        }
    }

    pub fn proof_type(&self) -> &str {
        self.suite.proof_type()
    }

    pub fn suite(&self) -> &Arc<dyn ProofSuite> {
        &self.suite
    }

    pub fn verification_method(&self) -> &VerificationMethodRef {
        &self.verification_method
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        let created = self.created.as_deref()?;
        DateTime::parse_from_rfc3339(created)
            .ok()
            .map(|created| created.with_timezone(&Utc))
    }

    pub fn challenge_nonce(&self) -> Option<&str> {
        self.challenge_nonce.as_deref()
    }

    pub fn signature_value(&self) -> Option<&[u8]> {
        self.signature_value.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature_value.is_some()
    }

    fn to_document(&self) -> ProofDocument {
        ProofDocument {
            type_: self.proof_type().to_string(),
            verification_method: self.verification_method.to_string(),
            created: self.created.clone(),
            challenge_nonce: self.challenge_nonce.clone(),
            signature_value: self
                .signature_value
                .as_ref()
                .map(|sig| base64::encode_config(sig, base64::URL_SAFE_NO_PAD)),
        }
    }

    /// SHA-256 of the canonical proof options followed by SHA-256 of the
    /// canonical document.
    fn to_signing_input(&self, document: &Value) -> Result<Vec<u8>, Error> {
        let mut options = self.to_document();
        options.signature_value = None;
        let options_normalized = serde_jcs::to_vec(&options)?;
        let doc_normalized = serde_jcs::to_vec(document)?;
        let data = [
            Sha256::digest(&options_normalized).to_vec(),
            Sha256::digest(&doc_normalized).to_vec(),
        ]
        .concat();
        Ok(data)
    }

    /// Sign `document` with `key`. A proof can be signed only once.
    pub fn sign(&mut self, document: &Value, key: &JWK) -> Result<(), Error> {
        if self.signature_value.is_some() {
            return Err(Error::ProofAlreadySigned);
        }
        self.created = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let signing_input = match self.to_signing_input(document) {
            Ok(signing_input) => signing_input,
            Err(err) => {
                self.created = None;
                return Err(err);
            }
        };
        match self.suite.sign(&signing_input, key) {
            Ok(signature) => {
                self.signature_value = Some(signature);
                log::debug!("Signed proof with {}", self.verification_method);
                Ok(())
            }
            Err(err) => {
                self.created = None;
                Err(err)
            }
        }
    }

    /// Check the signature over `document` against `public_key`. Unsigned
    /// proofs never verify.
    pub fn verify(&self, document: &Value, public_key: &JWK) -> bool {
        let signature = match &self.signature_value {
            Some(signature) => signature,
            None => {
                log::warn!("Proof by {} is not signed", self.verification_method);
                return false;
            }
        };
        let result = self
            .to_signing_input(document)
            .and_then(|signing_input| self.suite.verify(&signing_input, signature, public_key));
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!(
                    "Signature by {} does not verify: {}",
                    self.verification_method,
                    err
                );
                false
            }
        }
    }

    pub fn encode_to_json(&self) -> Value {
        serde_json::to_value(self.to_document()).unwrap_or(Value::Null)
    }

    /// Rebuild a proof from its JSON form. The signature is not checked.
    pub fn decode_from_json(json: &Value, suites: &ProofTypeManager) -> Result<Self, Error> {
        let document = ProofDocument::deserialize(json).map_err(Error::malformed)?;
        let suite = suites.get_proof_suite(&document.type_)?;
        if let Some(created) = &document.created {
            DateTime::parse_from_rfc3339(created).map_err(|err| {
                Error::MalformedInput(format!("Invalid created timestamp {}: {}", created, err))
            })?;
        }
        let verification_method = VerificationMethodRef::parse(&document.verification_method)?;
        let signature_value = document
            .signature_value
            .map(|sig| base64::decode_config(sig, base64::URL_SAFE_NO_PAD))
            .transpose()?;
        Ok(Self {
            suite,
            verification_method,
            created: document.created,
            challenge_nonce: document.challenge_nonce,
            signature_value,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn manager() -> ProofTypeManager {
        ProofTypeManager::new()
    }

    #[cfg(feature = "ed25519")]
    fn ed25519_proof(manager: &ProofTypeManager, nonce: Option<&str>) -> Proof {
        Proof::new(
            manager
                .get_proof_suite(crate::suites::ED25519_SIGNATURE_2018)
                .unwrap(),
            VerificationMethodRef::new("did:example:alice", "keys-1"),
            nonce.map(str::to_string),
        )
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn sign_and_verify() {
        let manager = manager();
        let key = JWK::ed25519_from_secret(&[3u8; 32]);
        let document = json!({"hello": "world", "n": 1});
        let mut proof = ed25519_proof(&manager, Some("nonce"));
        assert!(!proof.verify(&document, &key.to_public()));

        proof.sign(&document, &key).unwrap();
        assert!(proof.is_signed());
        assert!(proof.created().is_some());
        assert!(proof.verify(&document, &key.to_public()));
        assert!(!proof.verify(&json!({"hello": "world", "n": 2}), &key.to_public()));
        assert!(!proof.verify(&document, &JWK::ed25519_from_secret(&[4u8; 32])));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn key_order_does_not_matter() {
        let manager = manager();
        let key = JWK::ed25519_from_secret(&[3u8; 32]);
        let mut proof = ed25519_proof(&manager, None);
        proof.sign(&json!({"a": 1, "b": [1, 2]}), &key).unwrap();
        let reordered: Value = serde_json::from_str(r#"{"b":[1,2],"a":1}"#).unwrap();
        assert!(proof.verify(&reordered, &key));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn sign_twice() {
        let manager = manager();
        let key = JWK::ed25519_from_secret(&[3u8; 32]);
        let mut proof = ed25519_proof(&manager, None);
        proof.sign(&json!({}), &key).unwrap();
        let err = proof.sign(&json!({}), &key).unwrap_err();
        assert!(matches!(err, Error::ProofAlreadySigned));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn encode_decode() {
        let manager = manager();
        let key = JWK::ed25519_from_secret(&[3u8; 32]);
        let document = json!({"claims": {"DID": "did:example:alice"}});
        let mut proof = ed25519_proof(&manager, Some("abc"));
        proof.sign(&document, &key).unwrap();

        let encoded = proof.encode_to_json();
        assert_eq!(encoded["type"], "Ed25519Signature2018");
        assert_eq!(encoded["verificationMethod"], "did:example:alice#keys-1");
        assert_eq!(encoded["challengeNonce"], "abc");
        assert!(encoded["signatureValue"].is_string());

        let decoded = Proof::decode_from_json(&encoded, &manager).unwrap();
        assert_eq!(decoded, proof);
        assert_eq!(decoded.encode_to_json(), encoded);
        assert!(decoded.verify(&document, &key.to_public()));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn created_is_kept_as_written() {
        let manager = manager();
        let json = r##"{"created":"2024-01-01T00:00:00.000Z","signatureValue":"AAEC","type":"Ed25519Signature2018","verificationMethod":"did:example:alice#keys-1"}"##;
        let encoded: Value = serde_json::from_str(json).unwrap();
        let proof = Proof::decode_from_json(&encoded, &manager).unwrap();
        assert_eq!(
            proof.created().unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(serde_json::to_string(&proof.encode_to_json()).unwrap(), json);

        let err = Proof::decode_from_json(
            &json!({
                "type": "Ed25519Signature2018",
                "verificationMethod": "did:example:alice#keys-1",
                "created": "yesterday"
            }),
            &manager,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn decode_unknown_type() {
        let err = Proof::decode_from_json(
            &json!({
                "type": "UnknownSignature2099",
                "verificationMethod": "did:example:alice#keys-1"
            }),
            &manager(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ProofTypeNotFound(_)));
    }

    #[test]
    #[cfg(feature = "ed25519")]
    fn decode_malformed() {
        let manager = manager();
        let err = Proof::decode_from_json(&json!("proof"), &manager).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        let err = Proof::decode_from_json(
            &json!({"type": "Ed25519Signature2018", "verificationMethod": "keys-1"}),
            &manager,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidVerificationMethod(_)));
        let err = Proof::decode_from_json(
            &json!({
                "type": "Ed25519Signature2018",
                "verificationMethod": "did:example:alice#keys-1",
                "signatureValue": "not base64!"
            }),
            &manager,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }
}
