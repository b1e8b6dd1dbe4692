use serde_json::{Map, Value};

use crate::credential::Credential;
use crate::did::Document;
use crate::did_resolve::DIDResolver;
use crate::error::Error;
use crate::jwk::JWK;
use crate::proof_type::{ProofBuildOptions, ProofTypeManager};
use crate::schema::{SchemaManager, DID_AUTHENTICATION_CREDENTIAL};
use crate::vc::{VerifiableCredential, VerificationErrorCode, VerificationOptions};

/// Prove control of `document`'s DID by signing a self-issued
/// `DIDAuthenticationCredential` bound to `challenge`.
pub fn sign_did_authentication(
    document: &Document,
    key_id: &str,
    key: &JWK,
    proof_type: &str,
    challenge: &str,
    suites: &ProofTypeManager,
    schemas: &SchemaManager,
) -> Result<VerifiableCredential, Error> {
    let schema = schemas.get_schema(DID_AUTHENTICATION_CREDENTIAL)?;
    let mut claims = Map::new();
    claims.insert("DID".to_string(), Value::String(document.id.clone()));
    let credential = Credential::create(&schema, &document.id, claims)?;
    let mut proof = suites.create_proof_with_builder(
        proof_type,
        ProofBuildOptions {
            issuer: document.clone(),
            key_id: key_id.to_string(),
            challenge_nonce: Some(challenge.to_string()),
        },
    )?;
    proof.sign(&credential.encode_to_json(), key)?;
    Ok(VerifiableCredential::create(credential, proof))
}

/// Check a DID authentication made with [`sign_did_authentication`].
///
/// The credential is self-issued, so issuer trust is not required. The
/// claimed DID must be the issuer, the signature must verify and only then
/// is the proof's challenge compared with `challenge`.
pub async fn verify_did_authentication(
    vc: &VerifiableCredential,
    challenge: &str,
    resolver: &dyn DIDResolver,
    options: Option<VerificationOptions>,
    schemas: &SchemaManager,
) -> VerificationErrorCode {
    let options = options.unwrap_or_default();
    let credential = vc.credential();
    if credential.schema_name() != DID_AUTHENTICATION_CREDENTIAL {
        log::warn!("Not a DID authentication: {}", credential.schema_name());
        return VerificationErrorCode::SchemaViolation;
    }
    match schemas.get_schema(DID_AUTHENTICATION_CREDENTIAL) {
        Ok(schema) => {
            if !schema.does_claims_follow_schema(credential.claims()) {
                return VerificationErrorCode::SchemaViolation;
            }
        }
        Err(_) => return VerificationErrorCode::UnknownSchema,
    }
    if credential.claims().get("DID").and_then(Value::as_str) != Some(credential.issuer_did()) {
        log::warn!(
            "DID authentication by {} is about another DID",
            credential.issuer_did()
        );
        return VerificationErrorCode::SchemaViolation;
    }
    let params = match vc.resolve_parameters(resolver, &options).await {
        Ok(params) => params,
        Err(err) => {
            log::warn!("{}", err);
            return VerificationErrorCode::ResolutionFailure;
        }
    };
    let signature = vc.verify_signature(&params);
    if !signature.is_success() {
        return signature;
    }
    if vc.proof().challenge_nonce() != Some(challenge) {
        log::warn!(
            "DID authentication by {} is not bound to the challenge",
            credential.issuer_did()
        );
        return VerificationErrorCode::ChallengeMismatch;
    }
    VerificationErrorCode::Success
}
