// libs/scheduling-cell/src/services/booking.rs
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Actor, ActorRole, Appointment, AppointmentFilters, AppointmentQuery, BookAppointmentRequest,
    NewAppointment, SchedulingError,
};
use crate::services::conflict;
use crate::store::{SchedulingStore, StoreError};
use crate::time::{TimeOfDay, TimeRange};

/// One lock per `(doctor, date)` pair. Booking holds the lock across the
/// read-check-insert sequence so two requests for the same doctor and
/// date cannot both observe a free slot and both insert. Entries are
/// removed once uncontended, so the map stays bounded by the number of
/// in-flight bookings.
type SlotLocks = Mutex<HashMap<(Uuid, NaiveDate), Arc<Mutex<()>>>>;

pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    locks: SlotLocks,
    slot_minutes: u16,
}

impl BookingService {
    pub fn new(store: Arc<dyn SchedulingStore>, slot_minutes: u16) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            slot_minutes,
        }
    }

    /// Book a fixed-duration appointment. On success exactly one
    /// appointment row is created, with status `scheduled`.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {} at {}",
            request.patient_id, request.doctor_id, request.appointment_date, request.start_time
        );

        let doctor = self
            .store
            .fetch_doctor(request.doctor_id)
            .await
            .map_err(persistence)?
            .ok_or(SchedulingError::DoctorNotFound)?;

        if !doctor.is_approved {
            return Err(SchedulingError::DoctorNotApproved);
        }

        // A start too close to midnight must be rejected, never wrapped
        // into the next day on the same calendar date.
        let end_time = request
            .start_time
            .checked_add_minutes(self.slot_minutes)
            .ok_or_else(|| {
                SchedulingError::InvalidInput(
                    "appointment would run past the end of the day".to_string(),
                )
            })?;

        let doctor_id = request.doctor_id;
        let date = request.appointment_date;

        let lock = self.slot_lock(doctor_id, date).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.reserve(request, end_time).await
        };
        self.release_slot_lock(doctor_id, date, lock).await;

        let appointment = outcome?;
        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    /// The critical section: runs with the slot lock held.
    async fn reserve(
        &self,
        request: BookAppointmentRequest,
        end_time: TimeOfDay,
    ) -> Result<Appointment, SchedulingError> {
        let existing = self
            .store
            .load_active_appointments(request.doctor_id, request.appointment_date)
            .await
            .map_err(persistence)?;

        let candidate = TimeRange {
            start: request.start_time,
            end: end_time,
        };
        let booked: Vec<TimeRange> = existing.iter().map(|a| a.time_range()).collect();

        if conflict::has_conflict(&candidate, &booked) {
            warn!(
                "Booking conflict for doctor {} on {} at {}",
                request.doctor_id, request.appointment_date, request.start_time
            );
            return Err(SchedulingError::SlotUnavailable);
        }

        let record = NewAppointment {
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            start_time: request.start_time,
            end_time,
            appointment_type: request.appointment_type,
            reason: request.reason,
        };

        self.store
            .insert_appointment(record)
            .await
            .map_err(|e| match e {
                // A uniqueness violation means another writer got the
                // slot first through some other path.
                StoreError::Constraint => SchedulingError::SlotUnavailable,
                other => persistence(other),
            })
    }

    /// List appointments visible to the actor, newest first. Admins see
    /// everything; doctors and patients only their own.
    pub async fn list_appointments(
        &self,
        actor: &Actor,
        filters: AppointmentFilters,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut query = AppointmentQuery {
            status: filters.status,
            date: filters.date,
            appointment_type: filters.appointment_type,
            ..AppointmentQuery::default()
        };

        match actor.role {
            ActorRole::Admin => {}
            ActorRole::Doctor => query.doctor_id = Some(actor.id),
            ActorRole::Patient => query.patient_id = Some(actor.id),
        }

        self.store
            .list_appointments(query)
            .await
            .map_err(persistence)
    }

    /// Fetch one appointment, gated by ownership: admins see everything,
    /// doctors and patients only their own.
    pub async fn get_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .store
            .fetch_appointment(appointment_id)
            .await
            .map_err(persistence)?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        let has_access = match actor.role {
            ActorRole::Admin => true,
            ActorRole::Doctor => actor.id == appointment.doctor_id,
            ActorRole::Patient => actor.id == appointment.patient_id,
        };

        if !has_access {
            return Err(SchedulingError::PermissionDenied);
        }

        Ok(appointment)
    }

    async fn slot_lock(&self, doctor_id: Uuid, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry((doctor_id, date)).or_default().clone()
    }

    /// Drop the map entry once no other task holds the lock. The map
    /// mutex is held while checking, so no new waiter can clone the Arc
    /// between the count check and the removal.
    async fn release_slot_lock(&self, doctor_id: Uuid, date: NaiveDate, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Two owners left: the map entry and our own handle.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&(doctor_id, date));
        }
    }
}

fn persistence(e: StoreError) -> SchedulingError {
    SchedulingError::Persistence(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, AppointmentType, DoctorProfile, WeeklyScheduleEntry};
    use async_trait::async_trait;
    use chrono::Utc;

    /// Always-approves, always-empty store; just enough for the lock
    /// bookkeeping to run end to end.
    struct StubStore;

    #[async_trait]
    impl SchedulingStore for StubStore {
        async fn load_weekly_schedule(
            &self,
            _doctor_id: Uuid,
            _day_of_week: u8,
        ) -> Result<Option<WeeklyScheduleEntry>, StoreError> {
            Ok(None)
        }

        async fn load_active_appointments(
            &self,
            _doctor_id: Uuid,
            _date: NaiveDate,
        ) -> Result<Vec<Appointment>, StoreError> {
            Ok(vec![])
        }

        async fn list_appointments(
            &self,
            _query: AppointmentQuery,
        ) -> Result<Vec<Appointment>, StoreError> {
            Ok(vec![])
        }

        async fn insert_appointment(
            &self,
            record: NewAppointment,
        ) -> Result<Appointment, StoreError> {
            let now = Utc::now();
            Ok(Appointment {
                id: Uuid::new_v4(),
                patient_id: record.patient_id,
                doctor_id: record.doctor_id,
                appointment_date: record.appointment_date,
                start_time: record.start_time,
                end_time: record.end_time,
                status: AppointmentStatus::Scheduled,
                appointment_type: record.appointment_type,
                reason: record.reason,
                notes: None,
                created_at: now,
                updated_at: now,
            })
        }

        async fn update_appointment_status(
            &self,
            _id: Uuid,
            _status: AppointmentStatus,
            _notes: Option<String>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn fetch_appointment(&self, _id: Uuid) -> Result<Option<Appointment>, StoreError> {
            Ok(None)
        }

        async fn fetch_doctor(&self, _doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError> {
            Ok(Some(DoctorProfile {
                id: _doctor_id,
                is_approved: true,
            }))
        }
    }

    fn request(doctor_id: Uuid, date: NaiveDate) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id: Uuid::new_v4(),
            doctor_id,
            appointment_date: date,
            start_time: "09:00".parse().unwrap(),
            appointment_type: AppointmentType::InPerson,
            reason: "Routine check-up".to_string(),
        }
    }

    #[tokio::test]
    async fn slot_locks_are_released_after_booking() {
        let service = BookingService::new(Arc::new(StubStore), 30);
        let date = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();

        for _ in 0..3 {
            service.book(request(Uuid::new_v4(), date)).await.unwrap();
        }

        assert!(service.locks.lock().await.is_empty());
    }
}
