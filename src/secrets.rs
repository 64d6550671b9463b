//! Google Secret Manager Integration
//!
//! Loads AWS credential sets stored as JSON secrets, using Application
//! Default Credentials (ADC) for GCP authentication:
//! - Local: `gcloud auth application-default login`
//! - GKE: Workload Identity
//! - Cloud Run: Service account
//!
//! Expected payload:
//! ```json
//! {"id": "prod", "access_key_id": "AKIA...", "secret_access_key": "..."}
//! ```

use anyhow::{Context, Result};
use gcloud_sdk::google::cloud::secretmanager::v1::secret_manager_service_client::SecretManagerServiceClient;
use gcloud_sdk::google::cloud::secretmanager::v1::AccessSecretVersionRequest;
use gcloud_sdk::{GoogleApi, GoogleAuthMiddleware};
use tracing::{debug, info};

use crate::credentials::AwsCredentialSet;

/// Google Secret Manager client wrapper
pub struct SecretManager {
    client: GoogleApi<SecretManagerServiceClient<GoogleAuthMiddleware>>,
    project_id: String,
}

impl SecretManager {
    pub async fn new(project_id: &str) -> Result<Self> {
        debug!("Initializing GSM client for project: {}", project_id);

        let client = GoogleApi::from_function(
            SecretManagerServiceClient::new,
            "https://secretmanager.googleapis.com",
            None,
        )
        .await
        .context("Failed to initialize GSM client")?;

        Ok(Self {
            client,
            project_id: project_id.to_string(),
        })
    }

    /// Fetch the latest version of a secret
    pub async fn get_secret(&self, secret_name: &str) -> Result<String> {
        let name = format!(
            "projects/{}/secrets/{}/versions/latest",
            self.project_id, secret_name
        );

        debug!("Fetching secret: {}", name);

        let response = self
            .client
            .get()
            .access_secret_version(AccessSecretVersionRequest { name })
            .await
            .context("Failed to access secret version")?;

        let payload = response
            .into_inner()
            .payload
            .context("Secret has no payload")?;

        Ok(payload.data.as_sensitive_str().to_string())
    }

    /// Fetch a secret and parse it as a credential set
    ///
    /// A payload without an `id` takes the secret name.
    pub async fn load_credential_set(&self, secret_name: &str) -> Result<AwsCredentialSet> {
        let raw = self.get_secret(secret_name).await?;
        let set = parse_credential_set(secret_name, &raw)?;

        info!(credential_id = %set.id, "Loaded AWS credential set from GSM");
        Ok(set)
    }
}

fn parse_credential_set(secret_name: &str, raw: &str) -> Result<AwsCredentialSet> {
    let mut value: serde_json::Value = serde_json::from_str(raw)
        .with_context(|| format!("Secret {} is not valid JSON", secret_name))?;

    if let Some(obj) = value.as_object_mut() {
        obj.entry("id")
            .or_insert_with(|| serde_json::Value::String(secret_name.to_string()));
    }

    serde_json::from_value(value)
        .with_context(|| format!("Secret {} is not an AWS credential set", secret_name))
}
