//! The service set shared by request handlers.

use std::sync::Arc;

use crate::clock::Clock;
use crate::lifecycle::service::LifecycleService;
use crate::pv::service::PvService;
use crate::statistics::service::StatsService;
use crate::store::Store;
use crate::verification::service::VerificationService;

/// All services, wired over one store and one clock.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub verifications: VerificationService,
    pub lifecycle: LifecycleService,
    pub pv: PvService,
    pub stats: StatsService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, payment_days: i64) -> Self {
        let verifications = VerificationService::new(store.clone(), clock.clone());
        Self {
            lifecycle: LifecycleService::new(store.clone(), clock.clone(), verifications.clone()),
            pv: PvService::new(store.clone(), clock, payment_days),
            stats: StatsService::new(store.clone()),
            verifications,
            store,
        }
    }
}
