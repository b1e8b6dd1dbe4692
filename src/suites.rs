use std::convert::TryFrom;

use crate::error::Error;
use crate::jwk::{Params, JWK};

/// A signature scheme usable for credential and presentation proofs.
///
/// Suites only sign and verify raw bytes; building the signing input and
/// locating the key are done by [`Proof`](crate::proof::Proof).
pub trait ProofSuite: Send + Sync {
    /// Value of the proof `type` member.
    fn proof_type(&self) -> &'static str;

    /// Verification method types whose keys this suite accepts.
    fn verification_method_types(&self) -> &'static [&'static str];

    fn sign(&self, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error>;

    fn verify(&self, data: &[u8], signature: &[u8], key: &JWK) -> Result<(), Error>;
}

pub const RSA_SIGNATURE_2018: &str = "RsaSignature2018";
pub const ED25519_SIGNATURE_2018: &str = "Ed25519Signature2018";

pub const RSA_VERIFICATION_KEY_2018: &str = "RsaVerificationKey2018";
pub const ED25519_VERIFICATION_KEY_2018: &str = "Ed25519VerificationKey2018";

/// RSASSA-PKCS1-v1_5 with SHA-256.
#[cfg(feature = "rsa")]
pub struct RsaSignature2018;

#[cfg(feature = "rsa")]
impl ProofSuite for RsaSignature2018 {
    fn proof_type(&self) -> &'static str {
        RSA_SIGNATURE_2018
    }

    fn verification_method_types(&self) -> &'static [&'static str] {
        &[RSA_VERIFICATION_KEY_2018]
    }

    fn sign(&self, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error> {
        use rsa::signature::{SignatureEncoding, Signer};
        let rsa_params = match &key.params {
            Params::RSA(rsa_params) => rsa_params,
            _ => return Err(Error::UnsupportedKeyType(RSA_SIGNATURE_2018.to_string())),
        };
        let private_key = rsa::RsaPrivateKey::try_from(rsa_params)?;
        let signing_key = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(private_key);
        let signature = signing_key.try_sign(data)?;
        Ok(signature.to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], key: &JWK) -> Result<(), Error> {
        use rsa::signature::Verifier;
        let rsa_params = match &key.params {
            Params::RSA(rsa_params) => rsa_params,
            _ => return Err(Error::UnsupportedKeyType(RSA_SIGNATURE_2018.to_string())),
        };
        let public_key = rsa::RsaPublicKey::try_from(rsa_params)?;
        let verifying_key = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(public_key);
        let signature = rsa::pkcs1v15::Signature::try_from(signature)?;
        verifying_key.verify(data, &signature)?;
        Ok(())
    }
}

/// EdDSA over Curve25519.
#[cfg(feature = "ed25519")]
pub struct Ed25519Signature2018;

#[cfg(feature = "ed25519")]
impl ProofSuite for Ed25519Signature2018 {
    fn proof_type(&self) -> &'static str {
        ED25519_SIGNATURE_2018
    }

    fn verification_method_types(&self) -> &'static [&'static str] {
        &[ED25519_VERIFICATION_KEY_2018]
    }

    fn sign(&self, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error> {
        use ed25519_dalek::Signer;
        let okp_params = match &key.params {
            Params::OKP(okp_params) => okp_params,
            _ => return Err(Error::UnsupportedKeyType(ED25519_SIGNATURE_2018.to_string())),
        };
        let signing_key = ed25519_dalek::SigningKey::try_from(okp_params)?;
        Ok(signing_key.sign(data).to_bytes().to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], key: &JWK) -> Result<(), Error> {
        let okp_params = match &key.params {
            Params::OKP(okp_params) => okp_params,
            _ => return Err(Error::UnsupportedKeyType(ED25519_SIGNATURE_2018.to_string())),
        };
        let verifying_key = ed25519_dalek::VerifyingKey::try_from(okp_params)?;
        let signature = ed25519_dalek::Signature::from_slice(signature)?;
        verifying_key.verify_strict(data, &signature)?;
        Ok(())
    }
}
