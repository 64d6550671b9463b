//! Region Accessor
//!
//! Attaches credentials or a fixed region list to a `RequestContext`, and
//! resolves the usable regions for that context on demand. The resolved list
//! is cached in the context's shared state, so every holder of the lineage
//! reuses it instead of calling the listing API again.
//!
//! ## Example Usage
//!
//! ```ignore
//! use aws_regions::{AwsCredentialSet, RegionAccessor, RequestContext};
//!
//! let accessor = RegionAccessor::ec2(Default::default());
//! let ctx = accessor
//!     .with_credentials(&RequestContext::background(), AwsCredentialSet::new("prod", key, secret))
//!     .await?;
//!
//! if accessor.is_usable(&ctx, "ap-east-1").await? {
//!     // ...
//! }
//! ```

use anyhow::anyhow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::{RegionCache, RegionSlot, RegionState, RequestContext};
use crate::credentials::{AwsCredentialSet, CredentialStore, InMemoryCredentialStore};
use crate::ec2::{Ec2ListerConfig, Ec2RegionLister, RegionLister};
use crate::types::{accessible_region_names, RegionError, RegionPhase};

/// Resolves and caches usable regions per request context
#[derive(Clone)]
pub struct RegionAccessor {
    credentials: Arc<dyn CredentialStore>,
    lister: Arc<dyn RegionLister>,
}

impl RegionAccessor {
    pub fn new(credentials: Arc<dyn CredentialStore>, lister: Arc<dyn RegionLister>) -> Self {
        Self { credentials, lister }
    }

    /// In-memory credential store and the EC2 lister
    pub fn ec2(config: Ec2ListerConfig) -> Self {
        Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(Ec2RegionLister::new(config)),
        )
    }

    /// Attach credentials used to resolve regions
    ///
    /// Registers `set` with the credential store. If the context already
    /// carries region state, its credential reference is replaced in place and
    /// a remotely resolved list is discarded; a fixed list is kept. Otherwise a
    /// new state is attached to the returned context.
    ///
    /// Waits on the state's lock, so on a lineage with a resolution in flight
    /// this returns only after that remote call has finished.
    pub async fn with_credentials(
        &self,
        ctx: &RequestContext,
        set: AwsCredentialSet,
    ) -> Result<RequestContext, RegionError> {
        let id = self
            .credentials
            .register(set)
            .await
            .map_err(RegionError::CredentialRegistration)?;

        match ctx.region_state() {
            Some(state) => {
                let mut slot = state.lock().await;
                if matches!(slot.cache, RegionCache::Resolved(_)) {
                    debug!(credential_id = %id, "Credentials changed, dropping resolved regions");
                    slot.cache = RegionCache::Empty;
                }
                slot.credential_id = Some(id);
                Ok(ctx.clone())
            }
            None => {
                debug!(credential_id = %id, "Attaching region state with credentials");
                Ok(ctx.attach(Arc::new(RegionState::with_credentials(id))))
            }
        }
    }

    /// Attach a fixed region list, bypassing remote resolution
    ///
    /// Replaces whatever list the lineage had cached. An empty list caches
    /// nothing and the next query resolves remotely.
    ///
    /// Waits on the state's lock, so on a lineage with a resolution in flight
    /// the override lands only after that remote call has finished.
    pub async fn with_fixed_regions<I, S>(&self, ctx: &RequestContext, regions: I) -> RequestContext
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regions: Vec<String> = regions.into_iter().map(Into::into).collect();
        debug!(count = regions.len(), "Attaching fixed regions");

        match ctx.region_state() {
            Some(state) => {
                state.lock().await.cache = RegionCache::Fixed(regions);
                ctx.clone()
            }
            None => ctx.attach(Arc::new(RegionState::with_fixed(regions))),
        }
    }

    /// Regions usable with the context's credentials
    ///
    /// Returns the cached list when there is one. Otherwise lists every region
    /// remotely, keeps those that are enabled for the account, and caches the
    /// result for the whole lineage. Concurrent callers on the same lineage
    /// wait for a single resolution.
    pub async fn usable_regions(&self, ctx: &RequestContext) -> Result<Vec<String>, RegionError> {
        let state = ctx.region_state().ok_or(RegionError::MissingState)?;
        let mut slot = state.lock().await;

        if let Some(regions) = slot.cached() {
            return Ok(regions.to_vec());
        }

        let regions = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => {
                warn!("Region resolution cancelled");
                Err(RegionError::RemoteResolution(anyhow!("request context cancelled")))
            }
            result = self.resolve(&slot) => result,
        }?;

        slot.cache = RegionCache::Resolved(regions.clone());
        Ok(regions)
    }

    /// Whether `region` is among the usable regions (exact match)
    pub async fn is_usable(&self, ctx: &RequestContext, region: &str) -> Result<bool, RegionError> {
        let regions = self.usable_regions(ctx).await?;
        Ok(regions.iter().any(|r| r == region))
    }

    /// Current phase of the context's region state, `None` when nothing is attached
    pub async fn phase(&self, ctx: &RequestContext) -> Option<RegionPhase> {
        match ctx.region_state() {
            Some(state) => Some(state.lock().await.phase()),
            None => None,
        }
    }

    async fn resolve(&self, slot: &RegionSlot) -> Result<Vec<String>, RegionError> {
        let credentials = match &slot.credential_id {
            Some(id) => self
                .credentials
                .resolve_provider(id)
                .await
                .map_err(|e| RegionError::RemoteResolution(anyhow::Error::new(e)))?,
            None => None,
        };

        let records = self
            .lister
            .list_all_regions(credentials)
            .await
            .map_err(RegionError::RemoteResolution)?;

        let total = records.len();
        let regions = accessible_region_names(records);

        info!(
            credential_id = ?slot.credential_id.as_ref().map(|id| id.as_str()),
            listed = total,
            usable = regions.len(),
            "Resolved usable regions"
        );

        Ok(regions)
    }
}
