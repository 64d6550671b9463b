//! AWS Regions Library
//!
//! Answers which AWS regions a set of credentials can use. Results are cached
//! on a request context so code sharing that context resolves them once.

pub mod accessor;
pub mod context;
pub mod credentials;
pub mod ec2;
#[cfg(feature = "gsm")]
pub mod secrets;
pub mod types;

pub use accessor::RegionAccessor;
pub use context::RequestContext;
pub use credentials::{AwsCredentialSet, CredentialError, CredentialStore, CredentialsId, InMemoryCredentialStore};
pub use ec2::{Ec2ListerConfig, Ec2RegionLister, RegionLister};
#[cfg(feature = "gsm")]
pub use secrets::SecretManager;
pub use types::{OptInStatus, RegionError, RegionPhase, RegionRecord};
