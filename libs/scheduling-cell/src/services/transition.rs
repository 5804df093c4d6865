// libs/scheduling-cell/src/services/transition.rs
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Actor, ActorRole, Appointment, AppointmentStatus, SchedulingError};
use crate::store::{SchedulingStore, StoreError};

/// Role-gated status transitions. No status is structurally terminal;
/// who the actor is decides what they may set.
pub struct StatusTransitionService {
    store: Arc<dyn SchedulingStore>,
}

impl StatusTransitionService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Whether `actor` may move `appointment` to `new_status`:
    /// admins may set anything on any appointment, doctors anything on
    /// their own, patients may only cancel their own.
    pub fn transition_allowed(
        actor: &Actor,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> bool {
        match actor.role {
            ActorRole::Admin => true,
            ActorRole::Doctor => actor.id == appointment.doctor_id,
            ActorRole::Patient => {
                actor.id == appointment.patient_id && new_status == AppointmentStatus::Cancelled
            }
        }
    }

    /// Apply a status update on behalf of `actor`. An omitted `notes`
    /// preserves the stored value; notes are never cleared implicitly.
    pub async fn update_status(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Status update on appointment {} to {} by {:?} {}",
            appointment_id, new_status, actor.role, actor.id
        );

        let appointment = self
            .store
            .fetch_appointment(appointment_id)
            .await
            .map_err(|e| SchedulingError::Persistence(e.to_string()))?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if !Self::transition_allowed(actor, &appointment, new_status) {
            warn!(
                "Denied status update on appointment {} to {} by {:?} {}",
                appointment_id, new_status, actor.role, actor.id
            );
            return Err(SchedulingError::PermissionDenied);
        }

        let notes = notes.or(appointment.notes);

        self.store
            .update_appointment_status(appointment_id, new_status, notes)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => SchedulingError::AppointmentNotFound,
                other => SchedulingError::Persistence(other.to_string()),
            })?;

        info!(
            "Appointment {} moved to {} by {:?} {}",
            appointment_id, new_status, actor.role, actor.id
        );
        Ok(())
    }
}
