use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::prelude::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// https://w3c-ccg.github.io/did-resolution/

use crate::did::Document;
use crate::error::Error;

pub const TYPE_DID_LD_JSON: &str = "application/did+ld+json";
pub const ERROR_INVALID_DID: &str = "invalid-did";
pub const ERROR_NOT_FOUND: &str = "not-found";
pub const ERROR_METHOD_NOT_SUPPORTED: &str = "method-not-supported";
pub const ERROR_TIMEOUT: &str = "timeout";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ResolutionInputMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "kebab-case")]
/// <https://w3c.github.io/did-core/#did-resolution-metadata-properties>
pub struct ResolutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
    #[serde(flatten)]
    pub property_set: HashMap<String, serde_json::Value>,
}

impl ResolutionMetadata {
    pub fn from_error(err: &str) -> Self {
        Self {
            error: Some(err.to_owned()),
            content_type: None,
        }
    }
}

/// Resolve a DID to its current DID document.
///
/// Implementations fetch the document from wherever the DID method publishes
/// it (a ledger, a web server, the DID itself). Failures are reported through
/// [`ResolutionMetadata::error`] using the `ERROR_*` codes of this module.
#[async_trait]
pub trait DIDResolver: Sync {
    async fn resolve(
        &self,
        did: &str,
        input_metadata: &ResolutionInputMetadata,
    ) -> (
        ResolutionMetadata,
        Option<Document>,
        Option<DocumentMetadata>,
    );
}

/// Resolve `did`, giving up after `timeout`.
///
/// Every failure, including an expired deadline, is reported as
/// [`Error::ResolutionFailure`]. Deactivated documents are refused.
pub async fn resolve_document(
    resolver: &dyn DIDResolver,
    did: &str,
    timeout: Option<Duration>,
) -> Result<Document, Error> {
    let input_metadata = ResolutionInputMetadata::default();
    let resolution = resolver.resolve(did, &input_metadata);
    let (res_meta, doc_opt, doc_meta_opt) = match timeout {
        Some(timeout) => match async_std::future::timeout(timeout, resolution).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Resolution of {} timed out after {:?}", did, timeout);
                return Err(Error::ResolutionFailure {
                    did: did.to_string(),
                    reason: ERROR_TIMEOUT.to_string(),
                });
            }
        },
        None => resolution.await,
    };
    if let Some(error) = res_meta.error {
        log::warn!("Resolution of {} failed: {}", did, error);
        return Err(Error::ResolutionFailure {
            did: did.to_string(),
            reason: error,
        });
    }
    if let Some(true) = doc_meta_opt.and_then(|meta| meta.deactivated) {
        return Err(Error::ResolutionFailure {
            did: did.to_string(),
            reason: "deactivated".to_string(),
        });
    }
    let doc = doc_opt.ok_or_else(|| Error::ResolutionFailure {
        did: did.to_string(),
        reason: ERROR_NOT_FOUND.to_string(),
    })?;
    if doc.id != did {
        return Err(Error::ResolutionFailure {
            did: did.to_string(),
            reason: format!("resolved document has id {}", doc.id),
        });
    }
    Ok(doc)
}
