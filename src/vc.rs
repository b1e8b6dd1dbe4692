use std::borrow::Cow;
use std::time::Duration;

use serde_json::Value;

use crate::credential::Credential;
use crate::did_resolve::DIDResolver;
use crate::error::Error;
use crate::proof::Proof;
use crate::proof_document::{resolve_proof_parameters, ProofParameters};
use crate::proof_type::ProofTypeManager;
use crate::schema::SchemaManager;

pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of verifying a credential or presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationErrorCode {
    Success,
    /// The signer's DID could not be resolved to a key.
    ResolutionFailure,
    InvalidSignature,
    UntrustedIssuer,
    SchemaViolation,
    /// The credential's schema is not registered with the verifier.
    UnknownSchema,
    /// The holder proof is not bound to the expected challenge.
    ChallengeMismatch,
}

impl VerificationErrorCode {
    pub fn is_success(&self) -> bool {
        *self == VerificationErrorCode::Success
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOptions {
    /// Deadline for each DID resolution. `None` waits forever.
    pub resolution_timeout: Option<Duration>,
    /// Challenge the holder proof of a presentation must carry.
    pub challenge: Option<String>,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            resolution_timeout: Some(DEFAULT_RESOLUTION_TIMEOUT),
            challenge: None,
        }
    }
}

/// A credential together with the issuer's proof over it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiableCredential {
    credential: Credential,
    proof: Proof,
    proof_parameters: Option<ProofParameters>,
}

impl VerifiableCredential {
    pub fn create(credential: Credential, proof: Proof) -> Self {
        Self {
            credential,
            proof,
            proof_parameters: None,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Key material attached when decoding, if any.
    pub fn proof_parameters(&self) -> Option<&ProofParameters> {
        self.proof_parameters.as_ref()
    }

    pub fn encode_to_json(&self) -> Value {
        let mut json = self.credential.encode_to_json();
        if let Value::Object(ref mut map) = json {
            map.insert("proof".to_string(), self.proof.encode_to_json());
        }
        json
    }

    /// Decode a credential and its proof. When `proof_parameters` is given,
    /// it is used in place of resolving the signer's DID at verification.
    pub fn decode_from_json(
        json: &Value,
        proof_parameters: Option<ProofParameters>,
        suites: &ProofTypeManager,
        schemas: &SchemaManager,
    ) -> Result<Self, Error> {
        let proof_json = json
            .get("proof")
            .ok_or_else(|| Error::MalformedInput("missing credential proof".to_string()))?;
        let proof = Proof::decode_from_json(proof_json, suites)?;
        let credential = Credential::decode_from_json(json, schemas)?;
        Ok(Self {
            credential,
            proof,
            proof_parameters,
        })
    }

    pub(crate) async fn resolve_parameters<'a>(
        &'a self,
        resolver: &dyn DIDResolver,
        options: &VerificationOptions,
    ) -> Result<Cow<'a, ProofParameters>, Error> {
        match &self.proof_parameters {
            Some(params) => Ok(Cow::Borrowed(params)),
            None => {
                resolve_proof_parameters(&self.proof, resolver, options.resolution_timeout)
                    .await
                    .map(Cow::Owned)
            }
        }
    }

    /// Signature check: the proof must be made by the issuer with the key
    /// described by `params`.
    pub(crate) fn verify_signature(&self, params: &ProofParameters) -> VerificationErrorCode {
        let vm = self.proof.verification_method();
        if !params.matches(vm) {
            log::warn!("Proof parameters for {} do not match {}", params.did, vm);
            return VerificationErrorCode::InvalidSignature;
        }
        if vm.did != self.credential.issuer_did() {
            log::warn!(
                "Credential issued by {} is signed by {}",
                self.credential.issuer_did(),
                vm.did
            );
            return VerificationErrorCode::InvalidSignature;
        }
        if !self
            .proof
            .verify(&self.credential.encode_to_json(), &params.public_key_jwk)
        {
            return VerificationErrorCode::InvalidSignature;
        }
        VerificationErrorCode::Success
    }

    /// Check signature, issuer trust and claims against already resolved key
    /// material.
    pub fn verify_with_parameters(
        &self,
        params: &ProofParameters,
        schemas: &SchemaManager,
    ) -> VerificationErrorCode {
        log::debug!("Verifying signature of {}", self.proof.verification_method());
        let result = self.verify_signature(params);
        if !result.is_success() {
            return result;
        }

        let schema_name = self.credential.schema_name();
        let schema = match schemas.get_schema(schema_name) {
            Ok(schema) => schema,
            Err(err) => {
                log::warn!("{}", err);
                return VerificationErrorCode::UnknownSchema;
            }
        };
        let issuer = self.credential.issuer_did();
        if !schema.is_did_trusted(issuer) {
            log::warn!(
                "{}",
                Error::UntrustedIssuer {
                    schema: schema_name.to_string(),
                    issuer: issuer.to_string(),
                }
            );
            return VerificationErrorCode::UntrustedIssuer;
        }

        if !schema.does_claims_follow_schema(self.credential.claims()) {
            log::warn!("{}", Error::SchemaViolation(schema_name.to_string()));
            return VerificationErrorCode::SchemaViolation;
        }
        VerificationErrorCode::Success
    }

    /// Verify using only key material attached at decode time.
    pub fn verify_offline(&self, schemas: &SchemaManager) -> VerificationErrorCode {
        match &self.proof_parameters {
            Some(params) => self.verify_with_parameters(params, schemas),
            None => {
                log::warn!(
                    "No proof parameters for {}",
                    self.proof.verification_method()
                );
                VerificationErrorCode::ResolutionFailure
            }
        }
    }

    /// Resolve the signer's key (unless attached at decode time), then
    /// check signature, issuer trust and claims, in that order.
    pub async fn verify(
        &self,
        options: Option<VerificationOptions>,
        resolver: &dyn DIDResolver,
        schemas: &SchemaManager,
    ) -> VerificationErrorCode {
        let options = options.unwrap_or_default();
        let params = match self.resolve_parameters(resolver, &options).await {
            Ok(params) => params,
            Err(err) => {
                log::warn!("{}", err);
                return VerificationErrorCode::ResolutionFailure;
            }
        };
        self.verify_with_parameters(&params, schemas)
    }
}
