//! Region Listing
//!
//! Trait-based abstraction over the remote "list every region" call, with the
//! EC2 `DescribeRegions` implementation used in production.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::config::Credentials;
use tracing::{debug, info, warn};

use crate::types::RegionRecord;

/// Region used to reach the EC2 endpoint when nothing else is configured
pub const FALLBACK_ENDPOINT_REGION: &str = "us-east-1";

/// Lists every region known to the cloud API, opted-in or not
#[async_trait]
pub trait RegionLister: Send + Sync {
    /// `credentials` of `None` means the default credential chain
    async fn list_all_regions(&self, credentials: Option<Credentials>) -> Result<Vec<RegionRecord>>;
}

/// SDK settings for the EC2 client
#[derive(Debug, Clone, Default)]
pub struct Ec2ListerConfig {
    /// Region whose EC2 endpoint answers `DescribeRegions`
    pub endpoint_region: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
}

/// `DescribeRegions` through aws-sdk-ec2
#[derive(Debug, Clone, Default)]
pub struct Ec2RegionLister {
    config: Ec2ListerConfig,
}

impl Ec2RegionLister {
    pub fn new(config: Ec2ListerConfig) -> Self {
        Self { config }
    }

    async fn client(&self, credentials: Option<Credentials>) -> aws_sdk_ec2::Client {
        let region = RegionProviderChain::first_try(self.config.endpoint_region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_ENDPOINT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(ref profile) = self.config.profile {
            loader = loader.profile_name(profile);
        }
        match credentials {
            Some(creds) => {
                debug!("Using registered static credentials");
                loader = loader.credentials_provider(creds);
            }
            None => debug!("Using default credential chain"),
        }

        aws_sdk_ec2::Client::new(&loader.load().await)
    }
}

#[async_trait]
impl RegionLister for Ec2RegionLister {
    async fn list_all_regions(&self, credentials: Option<Credentials>) -> Result<Vec<RegionRecord>> {
        let client = self.client(credentials).await;
        describe_all_regions(&client).await
    }
}

/// `DescribeRegions` including regions the account has not opted into
async fn describe_all_regions(client: &aws_sdk_ec2::Client) -> Result<Vec<RegionRecord>> {
    let output = client
        .describe_regions()
        .all_regions(true)
        .send()
        .await
        .context("EC2 DescribeRegions call failed")?;

    let mut records = Vec::with_capacity(output.regions().len());
    for region in output.regions() {
        match region.region_name() {
            Some(name) => records.push(RegionRecord::new(name, region.opt_in_status())),
            None => warn!("Skipping region entry without a name"),
        }
    }

    info!(count = records.len(), "Listed regions");
    Ok(records)
}
