// libs/scheduling-cell/tests/common/mod.rs
//
// In-memory SchedulingStore used by the integration tests. Behaves like
// the real store minus the wire: no uniqueness constraint, so every
// non-overlap guarantee the tests observe comes from the services.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, AppointmentQuery, AppointmentStatus, AppointmentType, BookAppointmentRequest,
    DoctorProfile, NewAppointment, WeeklyScheduleEntry,
};
use scheduling_cell::store::{SchedulingStore, StoreError};
use scheduling_cell::time::TimeOfDay;

pub fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

/// 2025-06-16 is a Monday (day_of_week 1 with Sunday = 0).
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

pub fn schedule_entry(
    doctor_id: Uuid,
    day_of_week: u8,
    start: &str,
    end: &str,
    break_window: Option<(&str, &str)>,
) -> WeeklyScheduleEntry {
    WeeklyScheduleEntry {
        doctor_id,
        day_of_week,
        start_time: t(start),
        end_time: t(end),
        break_start_time: break_window.map(|(s, _)| t(s)),
        break_end_time: break_window.map(|(_, e)| t(e)),
        is_available: true,
    }
}

pub fn book_request(
    patient_id: Uuid,
    doctor_id: Uuid,
    date: NaiveDate,
    start: &str,
) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id,
        doctor_id,
        appointment_date: date,
        start_time: t(start),
        appointment_type: AppointmentType::InPerson,
        reason: "Routine check-up".to_string(),
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    doctors: Mutex<Vec<DoctorProfile>>,
    schedules: Mutex<Vec<WeeklyScheduleEntry>>,
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_doctor(&self, id: Uuid, is_approved: bool) {
        self.doctors
            .lock()
            .unwrap()
            .push(DoctorProfile { id, is_approved });
    }

    pub fn add_schedule(&self, entry: WeeklyScheduleEntry) {
        self.schedules.lock().unwrap().push(entry);
    }

    /// Seed an appointment directly, bypassing the booking service.
    pub fn seed_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        start: &str,
        end: &str,
        status: AppointmentStatus,
    ) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.appointments.lock().unwrap().push(Appointment {
            id,
            patient_id,
            doctor_id,
            appointment_date: date,
            start_time: t(start),
            end_time: t(end),
            status,
            appointment_type: AppointmentType::InPerson,
            reason: "Seeded appointment".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn set_notes(&self, id: Uuid, notes: &str) {
        let mut appointments = self.appointments.lock().unwrap();
        if let Some(appointment) = appointments.iter_mut().find(|a| a.id == id) {
            appointment.notes = Some(notes.to_string());
        }
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.appointments.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn load_weekly_schedule(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<WeeklyScheduleEntry>, StoreError> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.doctor_id == doctor_id && s.day_of_week == day_of_week)
            .cloned())
    }

    async fn load_active_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.doctor_id == doctor_id && a.appointment_date == date && a.is_active())
            .cloned()
            .collect())
    }

    async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut result: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| query.doctor_id.map_or(true, |id| a.doctor_id == id))
            .filter(|a| query.patient_id.map_or(true, |id| a.patient_id == id))
            .filter(|a| query.status.map_or(true, |s| a.status == s))
            .filter(|a| query.date.map_or(true, |d| a.appointment_date == d))
            .filter(|a| query.appointment_type.map_or(true, |t| a.appointment_type == t))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(b.start_time.cmp(&a.start_time))
        });
        Ok(result)
    }

    async fn insert_appointment(&self, record: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Utc::now();
        let appointment = Appointment {
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
        };
        self.appointments.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<(), StoreError> {
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        appointment.status = status;
        appointment.notes = notes;
        appointment.updated_at = Utc::now();
        Ok(())
    }

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn fetch_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == doctor_id)
            .cloned())
    }
}
