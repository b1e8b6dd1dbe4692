//! Schema-bound Verifiable Credentials anchored to
//! [Decentralized Identifiers (DIDs)][dids].
//!
//! Issuers bind claims to a named [`Schema`], sign them with one of the
//! registered proof suites and hand out [`VerifiableCredential`]s. Holders
//! bundle credentials into a [`VerifiablePresentation`] signed with their own
//! DID. Verifiers resolve the signers' DID documents through a
//! [`DIDResolver`] and check signature, issuer trust and claims before
//! accepting anything.
//!
//! ```no_run
//! use vc_trust::{
//!     did_resolve::DIDResolver, Credential, Document, ProofBuildOptions, ProofTypeManager,
//!     SchemaManager, VerifiableCredential, JWK,
//! };
//!
//! # async fn example(issuer: Document, key: JWK, resolver: &dyn DIDResolver) -> Result<(), vc_trust::Error> {
//! let schemas = SchemaManager::instance();
//! let schema = schemas.get_schema("DomainValidatedCertificate")?;
//! schema.add_trusted_did(&issuer.id);
//!
//! let claims = serde_json::json!({"id": "did:example:site", "domains": ["example.org"]});
//! let claims = claims.as_object().cloned().unwrap_or_default();
//! let credential = Credential::create(&schema, &issuer.id, claims)?;
//!
//! let mut proof = ProofTypeManager::instance().create_proof_with_builder(
//!     "Ed25519Signature2018",
//!     ProofBuildOptions {
//!         issuer: issuer.clone(),
//!         key_id: "keys-1".to_string(),
//!         challenge_nonce: None,
//!     },
//! )?;
//! proof.sign(&credential.encode_to_json(), &key)?;
//!
//! let vc = VerifiableCredential::create(credential, proof);
//! assert!(vc.verify(None, resolver, schemas).await.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! [dids]: <https://www.w3.org/TR/did-core/>

pub mod credential;
pub mod did;
pub mod did_auth;
pub mod did_resolve;
pub mod error;
pub mod jwk;
pub mod presentation;
pub mod proof;
pub mod proof_document;
pub mod proof_type;
pub mod schema;
pub mod suites;
pub mod vc;

pub use credential::{Claims, Credential};
pub use did::{Document, VerificationMethodRef};
pub use error::{Error, ErrorKind};
pub use jwk::JWK;
pub use presentation::{Presentation, VerifiablePresentation};
pub use proof::Proof;
pub use proof_document::ProofParameters;
pub use proof_type::{ProofBuildOptions, ProofBuildingMethod, ProofTypeManager};
pub use schema::{Schema, SchemaManager};
pub use suites::ProofSuite;
pub use vc::{VerifiableCredential, VerificationErrorCode, VerificationOptions};
