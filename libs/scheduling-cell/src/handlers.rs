// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Actor, ActorRole, AppointmentFilters, BookAppointmentRequest, SchedulingError,
    UpdateStatusRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

/// Narrow the authenticated user to an Actor the core understands.
/// Tokens without a recognized role get nothing.
fn actor_from_user(user: &User) -> Result<Actor, AppError> {
    let id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid subject in token".to_string()))?;

    let role: ActorRole = user
        .role
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| AppError::Forbidden("Role not permitted".to_string()))?;

    Ok(Actor { role, id })
}

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        SchedulingError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        SchedulingError::DoctorNotApproved => {
            AppError::BadRequest("Doctor is not approved to accept appointments".to_string())
        }
        SchedulingError::InvalidInput(msg) => AppError::BadRequest(msg),
        SchedulingError::SlotUnavailable => {
            AppError::Conflict("This time slot is not available".to_string())
        }
        SchedulingError::PermissionDenied => {
            AppError::Forbidden("Access denied to this appointment".to_string())
        }
        SchedulingError::Persistence(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .availability
        .available_slots(query.doctor_id, query.date)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "data": slots
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(filters): Query<AppointmentFilters>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;

    let appointments = state
        .booking
        .list_appointments(&actor, filters)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "data": appointments
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;

    // Patients book for themselves; admins may book on a patient's behalf.
    let is_self = actor.role == ActorRole::Patient && actor.id == request.patient_id;
    let is_admin = actor.role == ActorRole::Admin;

    if !is_self && !is_admin {
        return Err(AppError::Forbidden(
            "Not authorized to book appointment for this patient".to_string(),
        ));
    }

    let appointment = state
        .booking
        .book(request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;

    let appointment = state
        .booking
        .get_appointment(&actor, appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;

    state
        .transitions
        .update_status(&actor, appointment_id, request.status, request.notes)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated successfully"
    })))
}
