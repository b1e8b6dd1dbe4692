use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// RFC 7517 - JSON Web Key (JWK)
// RFC 8037 - CFRG Elliptic Curve Diffie-Hellman (ECDH) and Signatures in JOSE

/// Minimum RSA modulus size accepted for signing and verification, in bytes.
pub const MIN_RSA_MODULUS_LEN: usize = 256;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JWK {
    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kty")]
pub enum Params {
    RSA(RSAParams),
    OKP(OctetParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RSAParams {
    // Parameters for RSA Public Keys
    #[serde(rename = "n")]
    pub modulus: Base64urlUInt,
    #[serde(rename = "e")]
    pub exponent: Base64urlUInt,

    // Parameters for RSA Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_exponent: Option<Base64urlUInt>,
    #[serde(rename = "p")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "q")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor: Option<Base64urlUInt>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OctetParams {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(rename = "x")]
    pub public_key: Base64urlUInt,
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Base64urlUInt>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct Base64urlUInt(pub Vec<u8>);

impl TryFrom<String> for Base64urlUInt {
    type Error = base64::DecodeError;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(base64::decode_config(
            data,
            base64::URL_SAFE_NO_PAD,
        )?))
    }
}

impl From<&Base64urlUInt> for String {
    fn from(data: &Base64urlUInt) -> String {
        base64::encode_config(&data.0, base64::URL_SAFE_NO_PAD)
    }
}

impl Serialize for Base64urlUInt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&String::from(self))
    }
}

impl From<Params> for JWK {
    fn from(params: Params) -> Self {
        JWK {
            algorithm: None,
            key_id: None,
            params,
        }
    }
}

impl JWK {
    /// Copy of this key without any private key parameters.
    pub fn to_public(&self) -> Self {
        let mut key = self.clone();
        key.params = match key.params {
            Params::RSA(params) => Params::RSA(RSAParams {
                private_exponent: None,
                first_prime_factor: None,
                second_prime_factor: None,
                ..params
            }),
            Params::OKP(params) => Params::OKP(OctetParams {
                private_key: None,
                ..params
            }),
        };
        key
    }

    pub fn is_private(&self) -> bool {
        match &self.params {
            Params::RSA(params) => params.private_exponent.is_some(),
            Params::OKP(params) => params.private_key.is_some(),
        }
    }

    /// Key type name, as found in the `kty` member.
    pub fn key_type(&self) -> &'static str {
        match self.params {
            Params::RSA(_) => "RSA",
            Params::OKP(_) => "OKP",
        }
    }

    /// Build an Ed25519 key from its 32-byte secret.
    #[cfg(feature = "ed25519")]
    pub fn ed25519_from_secret(secret: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(secret);
        JWK::from(Params::OKP(OctetParams {
            curve: "Ed25519".to_string(),
            public_key: Base64urlUInt(signing_key.verifying_key().to_bytes().to_vec()),
            private_key: Some(Base64urlUInt(secret.to_vec())),
        }))
    }
}

impl RSAParams {
    pub fn validate_key_size(&self) -> Result<(), Error> {
        let len = self.modulus.0.len();
        if len < MIN_RSA_MODULUS_LEN {
            return Err(Error::InvalidKeyLength(len));
        }
        Ok(())
    }
}

#[cfg(feature = "rsa")]
impl TryFrom<&RSAParams> for rsa::RsaPublicKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        params.validate_key_size()?;
        let n = rsa::BigUint::from_bytes_be(&params.modulus.0);
        let e = rsa::BigUint::from_bytes_be(&params.exponent.0);
        Ok(rsa::RsaPublicKey::new(n, e)?)
    }
}

#[cfg(feature = "rsa")]
impl TryFrom<&RSAParams> for rsa::RsaPrivateKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        params.validate_key_size()?;
        let (d, p, q) = match (
            &params.private_exponent,
            &params.first_prime_factor,
            &params.second_prime_factor,
        ) {
            (Some(d), Some(p), Some(q)) => (d, p, q),
            _ => return Err(Error::MissingPrivateKey),
        };
        let key = rsa::RsaPrivateKey::from_components(
            rsa::BigUint::from_bytes_be(&params.modulus.0),
            rsa::BigUint::from_bytes_be(&params.exponent.0),
            rsa::BigUint::from_bytes_be(&d.0),
            vec![
                rsa::BigUint::from_bytes_be(&p.0),
                rsa::BigUint::from_bytes_be(&q.0),
            ],
        )?;
        Ok(key)
    }
}

#[cfg(feature = "ed25519")]
fn ed25519_bytes(curve: &str, data: &[u8]) -> Result<[u8; 32], Error> {
    if curve != "Ed25519" {
        return Err(Error::UnsupportedKeyType(curve.to_string()));
    }
    <[u8; 32]>::try_from(data).map_err(|_| Error::InvalidKeyLength(data.len()))
}

#[cfg(feature = "ed25519")]
impl TryFrom<&OctetParams> for ed25519_dalek::VerifyingKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        let bytes = ed25519_bytes(&params.curve, &params.public_key.0)?;
        Ok(ed25519_dalek::VerifyingKey::from_bytes(&bytes)?)
    }
}

#[cfg(feature = "ed25519")]
impl TryFrom<&OctetParams> for ed25519_dalek::SigningKey {
    type Error = Error;
    fn try_from(params: &OctetParams) -> Result<Self, Self::Error> {
        let secret = params.private_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        let bytes = ed25519_bytes(&params.curve, &secret.0)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }
}
