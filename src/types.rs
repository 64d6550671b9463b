//! Types for region discovery
//!
//! Region records as returned by the listing API, the opt-in classification
//! used to decide accessibility, and the error taxonomy of the accessor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::CredentialError;

/// Opt-in status value for regions enabled by default
pub const OPT_IN_NOT_REQUIRED: &str = "opt-in-not-required";

/// Opt-in status value for regions the account has explicitly enabled
pub const OPTED_IN: &str = "opted-in";

/// A region entry as reported by the listing API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_in_status: Option<String>,
}

impl RegionRecord {
    pub fn new(name: impl Into<String>, opt_in_status: Option<&str>) -> Self {
        Self {
            name: name.into(),
            opt_in_status: opt_in_status.map(str::to_string),
        }
    }

    pub fn status(&self) -> Option<OptInStatus> {
        self.opt_in_status.as_deref().map(OptInStatus::from)
    }

    /// Whether the credentials that listed this region can use it.
    ///
    /// Entries without a status are treated as inaccessible.
    pub fn is_accessible(&self) -> bool {
        self.status().is_some_and(|s| s.is_accessible())
    }
}

/// Opt-in state of a region for the calling account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptInStatus {
    /// Enabled by default for every account
    NotRequired,
    /// Opt-in region that the account has enabled
    OptedIn,
    /// Opt-in region that the account has not enabled
    NotOptedIn,
    /// Any status string this crate does not know about
    Other(String),
}

impl OptInStatus {
    pub fn is_accessible(&self) -> bool {
        matches!(self, OptInStatus::NotRequired | OptInStatus::OptedIn)
    }
}

impl From<&str> for OptInStatus {
    fn from(value: &str) -> Self {
        match value {
            OPT_IN_NOT_REQUIRED => OptInStatus::NotRequired,
            OPTED_IN => OptInStatus::OptedIn,
            "not-opted-in" => OptInStatus::NotOptedIn,
            other => OptInStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for OptInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptInStatus::NotRequired => write!(f, "{}", OPT_IN_NOT_REQUIRED),
            OptInStatus::OptedIn => write!(f, "{}", OPTED_IN),
            OptInStatus::NotOptedIn => write!(f, "not-opted-in"),
            OptInStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Keep the accessible entries, preserving listing order
pub fn accessible_region_names(records: Vec<RegionRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter(RegionRecord::is_accessible)
        .map(|r| r.name)
        .collect()
}

/// Phase of the region state attached to a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPhase {
    /// Credentials attached, nothing resolved yet
    CredentialsOnly,
    /// A fixed region list was attached
    FixedSet,
    /// The region list was resolved remotely and cached
    Resolved,
}

impl std::fmt::Display for RegionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionPhase::CredentialsOnly => write!(f, "credentials-only"),
            RegionPhase::FixedSet => write!(f, "fixed"),
            RegionPhase::Resolved => write!(f, "resolved"),
        }
    }
}

/// Errors returned by the region accessor
#[derive(Debug, Error)]
pub enum RegionError {
    /// Queried a context that never had credentials or regions attached
    #[error("Context does not contain region state")]
    MissingState,

    /// The credential store rejected the credential set
    #[error("Credential registration failed")]
    CredentialRegistration(#[source] CredentialError),

    /// Provider resolution or the remote listing call failed
    #[error("Region resolution failed")]
    RemoteResolution(#[source] anyhow::Error),
}

impl RegionError {
    pub fn is_missing_state(&self) -> bool {
        matches!(self, RegionError::MissingState)
    }

    pub fn is_remote_resolution(&self) -> bool {
        matches!(self, RegionError::RemoteResolution(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opt_in_status_parsing() {
        assert_eq!(OptInStatus::from("opt-in-not-required"), OptInStatus::NotRequired);
        assert_eq!(OptInStatus::from("opted-in"), OptInStatus::OptedIn);
        assert_eq!(OptInStatus::from("not-opted-in"), OptInStatus::NotOptedIn);
        assert_eq!(
            OptInStatus::from("Opted-In"),
            OptInStatus::Other("Opted-In".to_string())
        );
        assert_eq!(OptInStatus::NotRequired.to_string(), "opt-in-not-required");
    }

    #[test]
    fn test_accessible_region_names_filters_and_keeps_order() {
        let records = vec![
            RegionRecord::new("us-east-1", Some("opt-in-not-required")),
            RegionRecord::new("af-south-1", Some("not-opted-in")),
            RegionRecord::new("ap-east-1", Some("opted-in")),
            RegionRecord::new("me-south-1", None),
            RegionRecord::new("il-central-1", Some("pending")),
            RegionRecord::new("eu-west-1", Some("opt-in-not-required")),
        ];

        assert_eq!(
            accessible_region_names(records),
            vec!["us-east-1", "ap-east-1", "eu-west-1"]
        );
    }

    #[test]
    fn test_region_record_json_without_status() {
        let record: RegionRecord = serde_json::from_str(r#"{"name":"eu-west-1"}"#).unwrap();
        assert_eq!(record.opt_in_status, None);
        assert!(!record.is_accessible());
    }

    #[test]
    fn test_error_display_and_sources() {
        use std::error::Error as _;

        let err = RegionError::RemoteResolution(
            anyhow::anyhow!("access denied").context("DescribeRegions failed"),
        );
        assert_eq!(err.to_string(), "Region resolution failed");
        assert_eq!(err.source().unwrap().to_string(), "DescribeRegions failed");
        assert!(err.is_remote_resolution());
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "Region resolution failed: DescribeRegions failed: access denied"
        );

        let err = RegionError::CredentialRegistration(CredentialError::EmptyId);
        assert_eq!(err.to_string(), "Credential registration failed");
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "Credential registration failed: Credential set id must not be empty"
        );

        assert!(RegionError::MissingState.is_missing_state());
    }
}
