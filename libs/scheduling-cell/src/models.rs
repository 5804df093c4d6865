// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::time::{TimeOfDay, TimeRange};

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// One row of a doctor's weekly availability template. Owned by the
/// doctor; read-only to this cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyScheduleEntry {
    pub doctor_id: Uuid,
    /// 0 = Sunday through 6 = Saturday.
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub break_start_time: Option<TimeOfDay>,
    pub break_end_time: Option<TimeOfDay>,
    pub is_available: bool,
}

impl WeeklyScheduleEntry {
    pub fn working_window(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// The break only exists when both bounds are present and well formed.
    pub fn break_window(&self) -> Option<TimeRange> {
        match (self.break_start_time, self.break_end_time) {
            (Some(start), Some(end)) => TimeRange::new(start, end),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Active appointments are the only ones that block a slot.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Insert payload for a new booking. The store assigns the id and
/// timestamps; status always starts out as `scheduled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentType {
    #[serde(rename = "in-person")]
    InPerson,
    #[serde(rename = "virtual")]
    Virtual,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::InPerson => write!(f, "in-person"),
            AppointmentType::Virtual => write!(f, "virtual"),
        }
    }
}

/// A bookable interval offered to the caller. Ephemeral: computed fresh
/// per query, never persisted, carries no identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub available: bool,
}

/// Booking-eligibility subset of the doctor record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub is_approved: bool,
}

// ==============================================================================
// ACTORS AND PERMISSIONS
// ==============================================================================

/// Closed set of roles this cell recognizes. Anything else coming out of
/// a token is rejected at the boundary before it reaches the guard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Patient,
    Doctor,
    Admin,
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(ActorRole::Patient),
            "doctor" => Ok(ActorRole::Doctor),
            "admin" => Ok(ActorRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub role: ActorRole,
    pub id: Uuid,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: TimeOfDay,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub reason: String,
}

/// Optional filters accepted by the appointment listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilters {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
}

/// Store-level listing query: the caller's filters plus the ownership
/// scope their role imposes.
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub appointment_type: Option<AppointmentType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    /// When omitted, the previous notes value is preserved.
    pub notes: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor is not approved to accept appointments")]
    DoctorNotApproved,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("This time slot is not available")]
    SlotUnavailable,

    #[error("Access denied")]
    PermissionDenied,

    #[error("Persistence failure: {0}")]
    Persistence(String),
}
