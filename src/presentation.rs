use std::borrow::Cow;

use futures::future::join_all;
use serde_json::{json, Value};

use crate::did_resolve::DIDResolver;
use crate::error::Error;
use crate::proof::Proof;
use crate::proof_document::{decode_proof_document, resolve_proof_parameters, ProofParameters};
use crate::proof_type::ProofTypeManager;
use crate::schema::SchemaManager;
use crate::vc::{VerifiableCredential, VerificationErrorCode, VerificationOptions};

/// An ordered, non-empty bundle of verifiable credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    verifiable_credential: Vec<VerifiableCredential>,
}

impl Presentation {
    pub fn create(verifiable_credential: Vec<VerifiableCredential>) -> Result<Self, Error> {
        if verifiable_credential.is_empty() {
            return Err(Error::EmptyPresentation);
        }
        Ok(Self {
            verifiable_credential,
        })
    }

    pub fn credentials(&self) -> &[VerifiableCredential] {
        &self.verifiable_credential
    }

    /// The document signed by a presentation proof.
    pub fn encode_to_json(&self) -> Value {
        let credentials: Vec<Value> = self
            .verifiable_credential
            .iter()
            .map(VerifiableCredential::encode_to_json)
            .collect();
        json!({ "verifiableCredential": credentials })
    }

    /// Decode every credential, resolving the key of each credential proof
    /// with `resolver` within `options.resolution_timeout`. The first failing
    /// credential aborts decoding.
    pub async fn decode_from_json(
        json: &Value,
        resolver: &dyn DIDResolver,
        options: Option<VerificationOptions>,
        suites: &ProofTypeManager,
        schemas: &SchemaManager,
    ) -> Result<Self, Error> {
        let options = options.unwrap_or_default();
        let credentials = json
            .get("verifiableCredential")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::MalformedInput("missing verifiableCredential array".to_string())
            })?;
        let mut verifiable_credential = Vec::with_capacity(credentials.len());
        for vc_json in credentials {
            let proof_json = vc_json
                .get("proof")
                .ok_or_else(|| Error::MalformedInput("missing credential proof".to_string()))?;
            let params =
                decode_proof_document(proof_json, resolver, options.resolution_timeout).await?;
            verifiable_credential.push(VerifiableCredential::decode_from_json(
                vc_json,
                Some(params),
                suites,
                schemas,
            )?);
        }
        Self::create(verifiable_credential)
    }
}

/// A presentation together with the holder's proof over it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiablePresentation {
    presentation: Presentation,
    proof: Proof,
    proof_parameters: Option<ProofParameters>,
}

impl VerifiablePresentation {
    pub fn create(presentation: Presentation, proof: Proof) -> Self {
        Self {
            presentation,
            proof,
            proof_parameters: None,
        }
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    pub fn proof_parameters(&self) -> Option<&ProofParameters> {
        self.proof_parameters.as_ref()
    }

    pub fn encode_to_json(&self) -> Value {
        let mut json = self.presentation.encode_to_json();
        if let Value::Object(ref mut map) = json {
            map.insert("proof".to_string(), self.proof.encode_to_json());
        }
        json
    }

    /// Decode a presentation. The holder key is taken from
    /// `proof_parameters` when given, otherwise resolved; credential keys
    /// are always resolved. Each resolution is bounded by
    /// `options.resolution_timeout`.
    pub async fn decode_from_json(
        json: &Value,
        resolver: &dyn DIDResolver,
        proof_parameters: Option<ProofParameters>,
        options: Option<VerificationOptions>,
        suites: &ProofTypeManager,
        schemas: &SchemaManager,
    ) -> Result<Self, Error> {
        let options = options.unwrap_or_default();
        let proof_json = json
            .get("proof")
            .ok_or_else(|| Error::MalformedInput("missing presentation proof".to_string()))?;
        let proof = Proof::decode_from_json(proof_json, suites)?;
        let proof_parameters = match proof_parameters {
            Some(params) => params,
            None => decode_proof_document(proof_json, resolver, options.resolution_timeout).await?,
        };
        let presentation =
            Presentation::decode_from_json(json, resolver, Some(options), suites, schemas).await?;
        Ok(Self {
            presentation,
            proof,
            proof_parameters: Some(proof_parameters),
        })
    }

    fn verify_holder(
        &self,
        params: &ProofParameters,
        options: &VerificationOptions,
    ) -> VerificationErrorCode {
        let vm = self.proof.verification_method();
        if !params.matches(vm) {
            log::warn!("Proof parameters for {} do not match {}", params.did, vm);
            return VerificationErrorCode::InvalidSignature;
        }
        if !self
            .proof
            .verify(&self.presentation.encode_to_json(), &params.public_key_jwk)
        {
            return VerificationErrorCode::InvalidSignature;
        }
        if let Some(challenge) = &options.challenge {
            if self.proof.challenge_nonce() != Some(challenge.as_str()) {
                log::warn!("Presentation by {} is not bound to the challenge", vm.did);
                return VerificationErrorCode::ChallengeMismatch;
            }
        }
        VerificationErrorCode::Success
    }

    fn first_failure(results: Vec<VerificationErrorCode>) -> VerificationErrorCode {
        results
            .into_iter()
            .find(|result| !result.is_success())
            .unwrap_or(VerificationErrorCode::Success)
    }

    /// Verify using only key material attached at decode time.
    pub fn verify_offline(
        &self,
        options: Option<VerificationOptions>,
        schemas: &SchemaManager,
    ) -> VerificationErrorCode {
        let options = options.unwrap_or_default();
        let holder = match &self.proof_parameters {
            Some(params) => self.verify_holder(params, &options),
            None => VerificationErrorCode::ResolutionFailure,
        };
        if !holder.is_success() {
            return holder;
        }
        Self::first_failure(
            self.presentation
                .credentials()
                .iter()
                .map(|vc| vc.verify_offline(schemas))
                .collect(),
        )
    }

    /// Verify the holder proof, then every contained credential. Returns the
    /// first failure, holder first, then credentials in presentation order.
    pub async fn verify(
        &self,
        options: Option<VerificationOptions>,
        resolver: &dyn DIDResolver,
        schemas: &SchemaManager,
    ) -> VerificationErrorCode {
        let options = options.unwrap_or_default();
        let params = match &self.proof_parameters {
            Some(params) => Cow::Borrowed(params),
            None => match resolve_proof_parameters(
                &self.proof,
                resolver,
                options.resolution_timeout,
            )
            .await
            {
                Ok(params) => Cow::Owned(params),
                Err(err) => {
                    log::warn!("{}", err);
                    return VerificationErrorCode::ResolutionFailure;
                }
            },
        };
        log::debug!("Verifying holder proof of {}", self.proof.verification_method());
        let holder = self.verify_holder(&params, &options);
        if !holder.is_success() {
            return holder;
        }

        let results = join_all(
            self.presentation
                .credentials()
                .iter()
                .map(|vc| vc.verify(Some(options.clone()), resolver, schemas)),
        )
        .await;
        Self::first_failure(results)
    }
}
