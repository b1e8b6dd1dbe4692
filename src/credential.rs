use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::schema::{Schema, SchemaManager};

/// Claims of a credential, keyed by property name.
pub type Claims = Map<String, Value>;

/// A set of claims made by an issuer under a named schema.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Credential {
    #[serde(rename = "schemaName")]
    schema_name: String,
    #[serde(rename = "issuerDID")]
    issuer_did: String,
    claims: Claims,
}

impl Credential {
    /// Fails with [`Error::SchemaViolation`] if `claims` do not follow
    /// `schema`.
    pub fn create(schema: &Schema, issuer_did: &str, claims: Claims) -> Result<Self, Error> {
        if !schema.does_claims_follow_schema(&claims) {
            return Err(Error::SchemaViolation(schema.name().to_string()));
        }
        Ok(Self {
            schema_name: schema.name().to_string(),
            issuer_did: issuer_did.to_string(),
            claims,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn issuer_did(&self) -> &str {
        &self.issuer_did
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// The document signed by a credential proof.
    pub fn encode_to_json(&self) -> Value {
        json!({
            "schemaName": self.schema_name,
            "issuerDID": self.issuer_did,
            "claims": self.claims,
        })
    }

    /// Members other than `schemaName`, `issuerDID` and `claims` are
    /// ignored. The claims are checked against the registered schema.
    pub fn decode_from_json(json: &Value, schemas: &SchemaManager) -> Result<Self, Error> {
        let credential = Credential::deserialize(json).map_err(Error::malformed)?;
        let schema = schemas.get_schema(&credential.schema_name)?;
        if !schema.does_claims_follow_schema(&credential.claims) {
            return Err(Error::SchemaViolation(credential.schema_name));
        }
        Ok(credential)
    }
}
