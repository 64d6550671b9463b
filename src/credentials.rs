//! Credential Store
//!
//! Holds AWS credential sets under opaque identifiers so contexts only carry
//! the identifier. Resolving an identifier yields signing credentials, or
//! `None` when the set defers to the default credential chain
//! (environment, profile, IMDS).

use async_trait::async_trait;
use aws_sdk_ec2::config::Credentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

const PROVIDER_NAME: &str = "aws-regions";

/// Opaque reference to a registered credential set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialsId(String);

impl CredentialsId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named set of AWS credentials
///
/// The static keys are optional as a pair. A set without keys defers to the
/// default credential chain when resolved.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsCredentialSet {
    pub id: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl AwsCredentialSet {
    /// Static access keys
    pub fn new(
        id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            session_token: None,
        }
    }

    /// A set that resolves to the default credential chain
    pub fn default_chain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }

    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn credentials_id(&self) -> CredentialsId {
        CredentialsId::new(self.id.clone())
    }

    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.id.trim().is_empty() {
            return Err(CredentialError::EmptyId);
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (None, None) => {
                if self.session_token.is_some() {
                    return Err(CredentialError::IncompleteKeys(self.id.clone()));
                }
                Ok(())
            }
            (Some(key), Some(secret)) => {
                if key.is_empty() || secret.is_empty() {
                    return Err(CredentialError::EmptyKey(self.id.clone()));
                }
                Ok(())
            }
            _ => Err(CredentialError::IncompleteKeys(self.id.clone())),
        }
    }

    fn to_credentials(&self) -> Option<Credentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some(Credentials::new(
                key.clone(),
                secret.clone(),
                self.session_token.clone(),
                None,
                PROVIDER_NAME,
            )),
            _ => None,
        }
    }
}

// Never print secrets
impl std::fmt::Debug for AwsCredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentialSet")
            .field("id", &self.id)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "** redacted **"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

/// Errors from the credential store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Credential set id must not be empty")]
    EmptyId,

    #[error("Credential set {0} must supply both an access key id and a secret access key")]
    IncompleteKeys(String),

    #[error("Credential set {0} has an empty access key id or secret access key")]
    EmptyKey(String),

    #[error("No credential set registered under id: {0}")]
    UnknownId(CredentialsId),
}

/// Registry of credential sets
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a credential set and return the identifier that refers to it
    async fn register(&self, set: AwsCredentialSet) -> Result<CredentialsId, CredentialError>;

    /// Resolve signing credentials, `None` meaning the default chain
    async fn resolve_provider(
        &self,
        id: &CredentialsId,
    ) -> Result<Option<Credentials>, CredentialError>;
}

/// Process-local credential store
#[derive(Default)]
pub struct InMemoryCredentialStore {
    sets: RwLock<HashMap<CredentialsId, AwsCredentialSet>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sets.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn register(&self, set: AwsCredentialSet) -> Result<CredentialsId, CredentialError> {
        set.validate()?;

        let id = set.credentials_id();
        let previous = self.sets.write().await.insert(id.clone(), set);

        if previous.is_some() {
            debug!(credential_id = %id, "Replaced registered credential set");
        } else {
            debug!(credential_id = %id, "Registered credential set");
        }

        Ok(id)
    }

    async fn resolve_provider(
        &self,
        id: &CredentialsId,
    ) -> Result<Option<Credentials>, CredentialError> {
        let sets = self.sets.read().await;
        let set = sets
            .get(id)
            .ok_or_else(|| CredentialError::UnknownId(id.clone()))?;

        Ok(set.to_credentials())
    }
}
