//! Request context
//!
//! A `RequestContext` is passed explicitly through a logical request or
//! session. It carries a cancellation token and, once something has been
//! attached, a shared handle to the region state. Clones and derived contexts
//! share the same state object, so a list resolved through one holder is seen
//! by every other holder.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialsId;
use crate::types::RegionPhase;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    regions: Option<Arc<RegionState>>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Root context with nothing attached and no cancellation
    pub fn background() -> Self {
        Self::default()
    }

    /// Root context cancelled through `token`
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            regions: None,
            cancel: token,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn region_state(&self) -> Option<&Arc<RegionState>> {
        self.regions.as_ref()
    }

    /// Derive a context that carries `state`
    pub(crate) fn attach(&self, state: Arc<RegionState>) -> Self {
        Self {
            regions: Some(state),
            cancel: self.cancel.clone(),
        }
    }
}

/// Region state shared by every context of one lineage
///
/// The slot sits behind an async mutex so a resolution can hold it across
/// the remote call.
#[derive(Debug)]
pub(crate) struct RegionState {
    slot: Mutex<RegionSlot>,
}

impl RegionState {
    pub(crate) fn with_credentials(id: CredentialsId) -> Self {
        Self {
            slot: Mutex::new(RegionSlot {
                credential_id: Some(id),
                cache: RegionCache::Empty,
            }),
        }
    }

    pub(crate) fn with_fixed(regions: Vec<String>) -> Self {
        Self {
            slot: Mutex::new(RegionSlot {
                credential_id: None,
                cache: RegionCache::Fixed(regions),
            }),
        }
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, RegionSlot> {
        self.slot.lock().await
    }
}

#[derive(Debug)]
pub(crate) struct RegionSlot {
    pub(crate) credential_id: Option<CredentialsId>,
    pub(crate) cache: RegionCache,
}

impl RegionSlot {
    pub(crate) fn phase(&self) -> RegionPhase {
        match self.cache {
            RegionCache::Empty => RegionPhase::CredentialsOnly,
            RegionCache::Fixed(_) => RegionPhase::FixedSet,
            RegionCache::Resolved(_) => RegionPhase::Resolved,
        }
    }

    /// The cached list, if any. An empty list is not a cache hit.
    pub(crate) fn cached(&self) -> Option<&[String]> {
        match &self.cache {
            RegionCache::Empty => None,
            RegionCache::Fixed(regions) | RegionCache::Resolved(regions) => {
                Some(regions.as_slice()).filter(|r| !r.is_empty())
            }
        }
    }
}

#[derive(Debug)]
pub(crate) enum RegionCache {
    Empty,
    Fixed(Vec<String>),
    Resolved(Vec<String>),
}
