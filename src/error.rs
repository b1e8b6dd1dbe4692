use thiserror::Error;

/// Error type for `vc-trust`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),
    #[error("Schema already exists: {0}")]
    SchemaAlreadyExists(String),
    #[error("Invalid schema definition: {0}")]
    InvalidSchema(String),
    #[error("Claims do not follow schema {0}")]
    SchemaViolation(String),
    #[error("Proof type not found: {0}")]
    ProofTypeNotFound(String),
    #[error("Proof type already registered: {0}")]
    ProofTypeAlreadyRegistered(String),
    #[error("Proof type {name} does not match suite type {proof_type}")]
    ProofTypeMismatch { name: String, proof_type: String },
    #[error("Proof has already been signed")]
    ProofAlreadySigned,
    #[error("Missing proof signature")]
    MissingProofSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Issuer {issuer} is not trusted for schema {schema}")]
    UntrustedIssuer { schema: String, issuer: String },
    #[error("Verification method not found: {0}")]
    KeyNotFound(String),
    #[error("Invalid verification method: {0}")]
    InvalidVerificationMethod(String),
    #[error("Unable to resolve {did}: {reason}")]
    ResolutionFailure { did: String, reason: String },
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Presentation must contain at least one credential")]
    EmptyPresentation,
    #[error("Missing private key parameters in JWK")]
    MissingPrivateKey,
    #[error("Unsupported key type for {0}")]
    UnsupportedKeyType(String),
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),
    #[cfg(feature = "rsa")]
    #[error(transparent)]
    Rsa(#[from] rsa::Error),
    #[error(transparent)]
    Signature(#[from] signature::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse failure taxonomy shared by every [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    SchemaViolation,
    InvalidSignature,
    UntrustedIssuer,
    ResolutionFailure,
    MalformedInput,
    /// Programmer or configuration error raised at construction time.
    Invalid,
    Crypto,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SchemaNotFound(_) | Error::ProofTypeNotFound(_) | Error::KeyNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::SchemaViolation(_) => ErrorKind::SchemaViolation,
            Error::InvalidSignature | Error::MissingProofSignature => ErrorKind::InvalidSignature,
            Error::UntrustedIssuer { .. } => ErrorKind::UntrustedIssuer,
            Error::ResolutionFailure { .. } => ErrorKind::ResolutionFailure,
            Error::MalformedInput(_)
            | Error::InvalidVerificationMethod(_)
            | Error::Base64(_)
            | Error::Json(_) => ErrorKind::MalformedInput,
            Error::SchemaAlreadyExists(_)
            | Error::InvalidSchema(_)
            | Error::ProofTypeAlreadyRegistered(_)
            | Error::ProofTypeMismatch { .. }
            | Error::ProofAlreadySigned
            | Error::EmptyPresentation => ErrorKind::Invalid,
            Error::MissingPrivateKey
            | Error::UnsupportedKeyType(_)
            | Error::InvalidKeyLength(_)
            | Error::Signature(_) => ErrorKind::Crypto,
            #[cfg(feature = "rsa")]
            Error::Rsa(_) => ErrorKind::Crypto,
        }
    }

    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        Error::MalformedInput(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> String {
        format!("{}", err)
    }
}
