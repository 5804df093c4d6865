// libs/scheduling-cell/src/store.rs
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentQuery, AppointmentStatus, DoctorProfile, NewAppointment,
    WeeklyScheduleEntry,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("constraint violation")]
    Constraint,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence collaborator for the scheduling cell. Injected into each
/// service; the composition root owns the concrete instance.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    /// The weekly template row for one doctor and weekday, if configured.
    async fn load_weekly_schedule(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<WeeklyScheduleEntry>, StoreError>;

    /// Appointments for the doctor on the date whose status still blocks
    /// a slot (not cancelled, not completed).
    async fn load_active_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Appointments matching the query, newest first.
    async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn insert_appointment(&self, record: NewAppointment) -> Result<Appointment, StoreError>;

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<(), StoreError>;

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn fetch_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError>;
}

// ==============================================================================
// SUPABASE-BACKED STORE
// ==============================================================================

pub struct SupabaseSchedulingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseSchedulingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    fn backend_err(e: anyhow::Error) -> StoreError {
        let message = e.to_string();
        // The REST layer reports duplicate-key rejections as 409.
        if message.contains("409") {
            StoreError::Constraint
        } else {
            StoreError::Backend(message)
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

#[async_trait]
impl SchedulingStore for SupabaseSchedulingStore {
    async fn load_weekly_schedule(
        &self,
        doctor_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<WeeklyScheduleEntry>, StoreError> {
        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&day_of_week=eq.{}",
            doctor_id, day_of_week
        );

        let result: Vec<WeeklyScheduleEntry> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(Self::backend_err)?;

        Ok(result.into_iter().next())
    }

    async fn load_active_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=not.in.(cancelled,completed)&order=start_time.asc",
            doctor_id, date
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(Self::backend_err)?;

        debug!(
            "Loaded {} active appointments for doctor {} on {}",
            appointments.len(),
            doctor_id,
            date
        );

        Ok(appointments)
    }

    async fn list_appointments(
        &self,
        query: AppointmentQuery,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut path =
            String::from("/rest/v1/appointments?order=appointment_date.desc,start_time.desc");
        if let Some(doctor_id) = query.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = query.patient_id {
            path.push_str(&format!("&patient_id=eq.{}", patient_id));
        }
        if let Some(status) = query.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(date) = query.date {
            path.push_str(&format!("&appointment_date=eq.{}", date));
        }
        if let Some(kind) = query.appointment_type {
            path.push_str(&format!("&type=eq.{}", kind));
        }

        self.supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(Self::backend_err)
    }

    async fn insert_appointment(&self, record: NewAppointment) -> Result<Appointment, StoreError> {
        let now = Utc::now();
        let appointment_data = json!({
            "id": Uuid::new_v4(),
            "patient_id": record.patient_id,
            "doctor_id": record.doctor_id,
            "appointment_date": record.appointment_date,
            "start_time": record.start_time,
            "end_time": record.end_time,
            "type": record.appointment_type,
            "reason": record.reason,
            "status": AppointmentStatus::Scheduled,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(appointment_data),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(Self::backend_err)?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no representation".to_string()))
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> Result<(), StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let update_data = json!({
            "status": status,
            "notes": notes,
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(update_data),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(Self::backend_err)?;

        if result.is_empty() {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn fetch_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);

        let result: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(Self::backend_err)?;

        Ok(result.into_iter().next())
    }

    async fn fetch_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=id,is_approved",
            doctor_id
        );

        let result: Vec<DoctorProfile> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(Self::backend_err)?;

        Ok(result.into_iter().next())
    }
}
