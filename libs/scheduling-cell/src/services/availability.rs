// libs/scheduling-cell/src/services/availability.rs
use chrono::{Datelike, NaiveDate, Weekday};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{SchedulingError, Slot, WeeklyScheduleEntry};
use crate::services::conflict;
use crate::store::SchedulingStore;
use crate::time::TimeRange;

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    slot_minutes: u16,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, slot_minutes: u16) -> Self {
        Self {
            store,
            slot_minutes,
        }
    }

    /// Compute the bookable slots for one doctor and date, ascending.
    /// Pure given the template and the active appointments; no day
    /// configured (or one marked unavailable) yields an empty sequence.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, SchedulingError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        let entry = self
            .store
            .load_weekly_schedule(doctor_id, day_of_week(date))
            .await
            .map_err(|e| SchedulingError::Persistence(e.to_string()))?;

        let Some(entry) = entry else {
            debug!("Doctor {} has no schedule for {}", doctor_id, date);
            return Ok(vec![]);
        };

        if !entry.is_available {
            debug!("Doctor {} is not available on {}", doctor_id, date);
            return Ok(vec![]);
        }

        let appointments = self
            .store
            .load_active_appointments(doctor_id, date)
            .await
            .map_err(|e| SchedulingError::Persistence(e.to_string()))?;

        let booked: Vec<TimeRange> = appointments.iter().map(|a| a.time_range()).collect();

        let slots = tile_slots(&entry, &booked, self.slot_minutes);
        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }
}

/// 0 = Sunday through 6 = Saturday, matching the schedule table.
fn day_of_week(date: NaiveDate) -> u8 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Tile the working window into fixed-duration half-open slots, dropping
/// any slot that strictly overlaps the break window or a booked interval.
/// A trailing partial slot that would run past the end of the window is
/// never emitted.
fn tile_slots(entry: &WeeklyScheduleEntry, booked: &[TimeRange], slot_minutes: u16) -> Vec<Slot> {
    let Some(window) = entry.working_window() else {
        return vec![];
    };
    let break_window = entry.break_window();

    let mut slots = Vec::new();
    let mut current = window.start;

    while let Some(slot_end) = current.checked_add_minutes(slot_minutes) {
        if slot_end > window.end {
            break;
        }

        let candidate = TimeRange {
            start: current,
            end: slot_end,
        };

        let during_break = break_window
            .as_ref()
            .is_some_and(|b| candidate.overlaps(b));

        if !during_break && !conflict::has_conflict(&candidate, booked) {
            slots.push(Slot {
                start_time: current,
                end_time: slot_end,
                available: true,
            });
        }

        current = slot_end;
    }

    slots
}
