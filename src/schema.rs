use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Error;

pub const DID_AUTHENTICATION_CREDENTIAL: &str = "DIDAuthenticationCredential";
pub const DOMAIN_VALIDATED_CERTIFICATE: &str = "DomainValidatedCertificate";
pub const ECLASS_CREDENTIAL: &str = "EclassCredential";

/// Primitive JSON types a schema property may declare.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl PrimitiveType {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (PrimitiveType::String, Value::String(_)) => true,
            (PrimitiveType::Number, Value::Number(_)) => true,
            (PrimitiveType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (PrimitiveType::Boolean, Value::Bool(_)) => true,
            (PrimitiveType::Array, Value::Array(_)) => true,
            (PrimitiveType::Object, Value::Object(_)) => true,
            (PrimitiveType::Null, Value::Null) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PropertyDefinition {
    #[serde(rename = "type")]
    pub type_: PrimitiveType,
}

/// Structural definition of a claims object: the subset of JSON Schema made
/// of `type: "object"`, `required` and `properties` with primitive types.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SchemaDefinition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
}

impl SchemaDefinition {
    pub fn from_json(value: Value) -> Result<Self, Error> {
        let definition: Self =
            serde_json::from_value(value).map_err(|e| Error::InvalidSchema(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.type_ != "object" {
            return Err(Error::InvalidSchema(format!(
                "expected type \"object\", found \"{}\"",
                self.type_
            )));
        }
        for field in &self.required {
            if !self.properties.contains_key(field) {
                return Err(Error::InvalidSchema(format!(
                    "required field \"{}\" is not declared in properties",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// A named claims schema together with the issuers trusted to issue
/// credentials under it.
#[derive(Debug)]
pub struct Schema {
    name: String,
    definition: SchemaDefinition,
    trusted_issuers: RwLock<BTreeSet<String>>,
}

impl Schema {
    pub fn new(name: &str, definition: SchemaDefinition) -> Result<Self, Error> {
        definition.validate()?;
        Ok(Self {
            name: name.to_string(),
            definition,
            trusted_issuers: RwLock::new(BTreeSet::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Open-world validation: required properties must be present with their
    /// declared type, optional declared properties must have their declared
    /// type when present, and undeclared properties are ignored.
    pub fn does_object_follow_schema(&self, object: &Value) -> bool {
        match object {
            Value::Object(object) => self.does_claims_follow_schema(object),
            _ => false,
        }
    }

    pub fn does_claims_follow_schema(&self, object: &Map<String, Value>) -> bool {
        for field in &self.definition.required {
            if !object.contains_key(field) {
                return false;
            }
        }
        self.definition
            .properties
            .iter()
            .all(|(field, property)| match object.get(field) {
                Some(value) => property.type_.matches(value),
                None => true,
            })
    }

    pub fn add_trusted_did(&self, did: &str) {
        self.trusted_issuers.write().insert(did.to_string());
    }

    /// Returns whether the DID was trusted.
    pub fn remove_trusted_did(&self, did: &str) -> bool {
        self.trusted_issuers.write().remove(did)
    }

    pub fn is_did_trusted(&self, did: &str) -> bool {
        self.trusted_issuers.read().contains(did)
    }

    pub fn trusted_dids(&self) -> Vec<String> {
        self.trusted_issuers.read().iter().cloned().collect()
    }
}

lazy_static::lazy_static! {
    static ref SCHEMA_MANAGER: SchemaManager = SchemaManager::new();
}

/// Registry of named schemas, in registration order.
#[derive(Debug)]
pub struct SchemaManager {
    schemas: RwLock<IndexMap<String, Arc<Schema>>>,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaManager {
    /// A registry seeded with the built-in schemas.
    pub fn new() -> Self {
        let mut schemas = IndexMap::new();
        for (name, definition) in builtin_schemas() {
            let schema = SchemaDefinition::from_json(definition)
                .and_then(|definition| Schema::new(name, definition));
            match schema {
                Ok(schema) => {
                    schemas.insert(name.to_string(), Arc::new(schema));
                }
                Err(err) => {
                    log::error!("Unable to load built-in schema {}: {}", name, err);
                    debug_assert!(false, "invalid built-in schema {}", name);
                }
            }
        }
        Self {
            schemas: RwLock::new(schemas),
        }
    }

    /// A registry without any schema.
    pub fn empty() -> Self {
        Self {
            schemas: RwLock::new(IndexMap::new()),
        }
    }

    /// Process-wide registry.
    pub fn instance() -> &'static SchemaManager {
        &SCHEMA_MANAGER
    }

    pub fn add_schema(&self, name: &str, definition: Value) -> Result<Arc<Schema>, Error> {
        let definition = SchemaDefinition::from_json(definition)?;
        let schema = Arc::new(Schema::new(name, definition)?);
        let mut schemas = self.schemas.write();
        if schemas.contains_key(name) {
            return Err(Error::SchemaAlreadyExists(name.to_string()));
        }
        schemas.insert(name.to_string(), schema.clone());
        log::debug!("Registered schema {}", name);
        Ok(schema)
    }

    pub fn get_schema(&self, name: &str) -> Result<Arc<Schema>, Error> {
        self.schemas
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::SchemaNotFound(name.to_string()))
    }

    pub fn get_schema_names(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }
}

fn builtin_schemas() -> Vec<(&'static str, Value)> {
    vec![
        (
            DID_AUTHENTICATION_CREDENTIAL,
            json!({
                "type": "object",
                "required": ["DID"],
                "properties": {
                    "DID": { "type": "string" }
                }
            }),
        ),
        (
            DOMAIN_VALIDATED_CERTIFICATE,
            json!({
                "type": "object",
                "required": ["id", "domains"],
                "properties": {
                    "id": { "type": "string" },
                    "domains": { "type": "array" }
                }
            }),
        ),
        (
            ECLASS_CREDENTIAL,
            json!({
                "type": "object",
                "required": ["id", "eclass"],
                "properties": {
                    "id": { "type": "string" },
                    "eclass": { "type": "object" }
                }
            }),
        ),
    ]
}
