//! Shared application state.

use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use portal_clients::FormRelayClient;
use portal_core::{
    defaults, AccessControl, EventBus, IdentityProvider, NoteRecordRepository, ObjectStore,
    SubmissionLimits,
};

use crate::services::{BrowseService, ReviewService, SubmissionService};

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Build a limiter allowing `requests` per `period_secs`, or None if either is zero.
pub fn build_rate_limiter(requests: u64, period_secs: u64) -> Option<Arc<GlobalRateLimiter>> {
    let burst = NonZeroU32::new(u32::try_from(requests).unwrap_or(u32::MAX))?;
    let quota = Quota::with_period(Duration::from_secs(period_secs))?.allow_burst(burst);
    Some(Arc::new(RateLimiter::direct(quota)))
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub reviews: Arc<ReviewService>,
    pub browse: Arc<BrowseService>,
    /// Decides who may act on the review queue.
    pub access: Arc<dyn AccessControl>,
    /// Identity provider (None if IDENTITY_API_KEY is not set).
    pub identity: Option<Arc<dyn IdentityProvider>>,
    /// Form relay (None if RELAY_URL is not set).
    pub relay: Option<Arc<FormRelayClient>>,
    /// Event bus for SSE notifications.
    pub event_bus: Arc<EventBus>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteRecordRepository>,
        objects: Arc<dyn ObjectStore>,
        access: Arc<dyn AccessControl>,
        limits: SubmissionLimits,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(defaults::EVENT_BUS_CAPACITY));
        Self {
            submissions: Arc::new(SubmissionService::new(
                notes.clone(),
                objects.clone(),
                event_bus.clone(),
                limits,
            )),
            reviews: Arc::new(ReviewService::new(notes.clone(), event_bus.clone())),
            browse: Arc::new(BrowseService::new(notes, objects, event_bus.clone())),
            access,
            identity: None,
            relay: None,
            event_bus,
            rate_limiter: None,
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_relay(mut self, relay: FormRelayClient) -> Self {
        self.relay = Some(Arc::new(relay));
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Option<Arc<GlobalRateLimiter>>) -> Self {
        self.rate_limiter = limiter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_requires_non_zero_quota() {
        assert!(build_rate_limiter(0, 60).is_none());
        assert!(build_rate_limiter(10, 0).is_none());
        assert!(build_rate_limiter(10, 60).is_some());
    }

    #[test]
    fn test_burst_is_enforced() {
        let limiter = build_rate_limiter(2, 3600).unwrap();
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
