use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::{Document, VerificationMethodRef};
use crate::did_resolve::{resolve_document, DIDResolver};
use crate::error::Error;
use crate::jwk::JWK;
use crate::proof::Proof;

/// Public key material for a proof, resolved from the signer's DID
/// document. Serializable so it can be cached and used offline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProofParameters {
    pub did: String,
    pub key_id: String,
    pub verification_method_type: String,
    pub public_key_jwk: JWK,
}

impl ProofParameters {
    pub fn verification_method(&self) -> VerificationMethodRef {
        VerificationMethodRef::new(&self.did, &self.key_id)
    }

    /// Whether these parameters describe the key referenced by `vm`.
    pub fn matches(&self, vm: &VerificationMethodRef) -> bool {
        self.verification_method() == *vm
    }
}

/// Extract the public key published under `key_id` in `document`.
pub fn resolve_key(document: &Document, key_id: &str) -> Result<ProofParameters, Error> {
    let not_found = || Error::KeyNotFound(VerificationMethodRef::new(&document.id, key_id).to_string());
    let vm = document
        .select_verification_method(key_id)
        .ok_or_else(not_found)?;
    let public_key_jwk = vm.public_key_jwk.as_ref().ok_or_else(not_found)?;
    Ok(ProofParameters {
        did: document.id.clone(),
        key_id: key_id.trim_start_matches('#').to_string(),
        verification_method_type: vm.type_.clone(),
        public_key_jwk: public_key_jwk.to_public(),
    })
}

pub async fn resolve_verification_method(
    vm: &VerificationMethodRef,
    resolver: &dyn DIDResolver,
    timeout: Option<Duration>,
) -> Result<ProofParameters, Error> {
    log::debug!("Resolving verification method {}", vm);
    let document = resolve_document(resolver, &vm.did, timeout).await?;
    resolve_key(&document, &vm.key_id)
}

/// Resolve the key that made `proof`.
pub async fn resolve_proof_parameters(
    proof: &Proof,
    resolver: &dyn DIDResolver,
    timeout: Option<Duration>,
) -> Result<ProofParameters, Error> {
    resolve_verification_method(proof.verification_method(), resolver, timeout).await
}

/// Resolve the key referenced by the `verificationMethod` of a proof in
/// JSON form, without decoding the rest of the proof.
pub async fn decode_proof_document(
    proof: &Value,
    resolver: &dyn DIDResolver,
    timeout: Option<Duration>,
) -> Result<ProofParameters, Error> {
    let did_url = proof
        .get("verificationMethod")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedInput("missing proof verificationMethod".to_string()))?;
    let vm = VerificationMethodRef::parse(did_url)?;
    resolve_verification_method(&vm, resolver, timeout).await
}
