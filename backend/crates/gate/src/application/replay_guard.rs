//! Replay suppression
//!
//! A challenge identifier may be redeemed once per challenge lifetime.

use crate::domain::repository::ReplayStore;
use crate::domain::value_objects::ChallengeId;
use crate::error::GateResult;
use std::sync::Arc;
use std::time::Duration;

/// Value stored for a redeemed identifier
pub const REDEEMED_MARKER: &str = "t";

pub struct ReplayGuard<R>
where
    R: ReplayStore,
{
    store: Arc<R>,
    ttl: Duration,
}

impl<R> ReplayGuard<R>
where
    R: ReplayStore,
{
    pub fn new(store: Arc<R>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Record the identifier as redeemed
    ///
    /// Returns `false` if it already was; check and insert are one
    /// atomic store operation.
    pub async fn redeem(&self, challenge_id: &ChallengeId) -> GateResult<bool> {
        self.store
            .insert_if_absent(challenge_id.as_str(), REDEEMED_MARKER, self.ttl)
            .await
    }

    /// Undo a redemption whose submission could not be completed
    pub async fn release(&self, challenge_id: &ChallengeId) -> GateResult<()> {
        self.store.remove(challenge_id.as_str()).await
    }
}
