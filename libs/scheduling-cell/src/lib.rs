// libs/scheduling-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod time;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;
use crate::services::transition::StatusTransitionService;
use crate::store::SchedulingStore;

/// Shared state for the scheduling routes. Built once by the composition
/// root; the booking service in particular must live for the lifetime of
/// the process so its per-slot locks actually serialize requests.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub availability: AvailabilityService,
    pub booking: BookingService,
    pub transitions: StatusTransitionService,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        let slot_minutes = config.slot_duration_minutes;
        Self {
            availability: AvailabilityService::new(Arc::clone(&store), slot_minutes),
            booking: BookingService::new(Arc::clone(&store), slot_minutes),
            transitions: StatusTransitionService::new(store),
            config,
        }
    }
}
