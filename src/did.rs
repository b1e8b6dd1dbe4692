use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::jwk::JWK;

// ***********************************************
// * Data Structures for Decentralized Identifiers
// * https://w3c.github.io/did-core/
// ***********************************************

pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethodMap>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodMap {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JWK>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub service_endpoint: Value,
}

/// Reference from a proof to a key: the controlling DID and the key id
/// (the DID URL fragment).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationMethodRef {
    pub did: String,
    pub key_id: String,
}

impl VerificationMethodRef {
    pub fn new(did: &str, key_id: &str) -> Self {
        Self {
            did: did.to_string(),
            key_id: key_id.trim_start_matches('#').to_string(),
        }
    }

    /// Parse a `did:method:id#key` DID URL.
    pub fn parse(did_url: &str) -> Result<Self, Error> {
        let (did, key_id) = did_url
            .split_once('#')
            .ok_or_else(|| Error::InvalidVerificationMethod(did_url.to_string()))?;
        if !did.starts_with("did:") || key_id.is_empty() {
            return Err(Error::InvalidVerificationMethod(did_url.to_string()));
        }
        Ok(Self::new(did, key_id))
    }
}

impl std::fmt::Display for VerificationMethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.did, self.key_id)
    }
}

impl Document {
    pub fn new(id: &str) -> Document {
        Document {
            context: DEFAULT_CONTEXT.to_string(),
            id: String::from(id),
            verification_method: Vec::new(),
            service: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Document, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add a verification method for `key` under `#key_id`. Private key
    /// parameters are never published.
    pub fn add_verification_method(&mut self, key_id: &str, type_: &str, key: &JWK) {
        let vm_ref = VerificationMethodRef::new(&self.id, key_id);
        self.verification_method.push(VerificationMethodMap {
            id: vm_ref.to_string(),
            type_: type_.to_string(),
            controller: self.id.clone(),
            public_key_jwk: Some(key.to_public()),
        });
    }

    /// Find a verification method by key id. Both absolute (`did#key`) and
    /// relative (`#key`) ids match.
    pub fn select_verification_method(&self, key_id: &str) -> Option<&VerificationMethodMap> {
        let key_id = key_id.trim_start_matches('#');
        self.verification_method.iter().find(|vm| {
            match vm.id.split_once('#') {
                Some(("", fragment)) => fragment == key_id,
                Some((did, fragment)) => did == self.id && fragment == key_id,
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document() {
        let id = "did:test:deadbeefcafe";
        let doc = Document::new(id);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["@context"], DEFAULT_CONTEXT);
        assert_eq!(doc.id, id);
        assert!(value.get("verificationMethod").is_none());
    }

    #[test]
    fn document_from_json() {
        let doc_str = r##"{
            "@context": "https://www.w3.org/ns/did/v1",
            "id": "did:test:deadbeefcafe",
            "verificationMethod": [{
                "id": "#keys-1",
                "type": "Ed25519VerificationKey2018",
                "controller": "did:test:deadbeefcafe"
            }]
        }"##;
        let doc = Document::from_json(doc_str).unwrap();
        assert_eq!(doc.id, "did:test:deadbeefcafe");
        assert!(doc.select_verification_method("keys-1").is_some());
        assert!(doc.select_verification_method("#keys-1").is_some());
        assert!(doc.select_verification_method("keys-2").is_none());
    }

    #[test]
    fn absolute_id_must_match_document() {
        let mut doc = Document::new("did:test:a");
        doc.verification_method.push(VerificationMethodMap {
            id: "did:test:b#keys-1".to_string(),
            type_: "Ed25519VerificationKey2018".to_string(),
            controller: "did:test:b".to_string(),
            public_key_jwk: None,
        });
        assert!(doc.select_verification_method("keys-1").is_none());
    }

    #[test]
    fn parse_verification_method_ref() {
        let vm = VerificationMethodRef::parse("did:example:123#keys-1").unwrap();
        assert_eq!(vm.did, "did:example:123");
        assert_eq!(vm.key_id, "keys-1");
        assert_eq!(vm.to_string(), "did:example:123#keys-1");
        VerificationMethodRef::parse("did:example:123").unwrap_err();
        VerificationMethodRef::parse("https://example.org#keys-1").unwrap_err();
        VerificationMethodRef::parse("did:example:123#").unwrap_err();
    }
}
