use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{catalog, queries};
use crate::errors::{AppError, AppResult};

/// One seat of a hall as seen for a particular showing.
#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub seat_id: Uuid,
    pub seat_number: String,
    pub seat_row: String,
    pub seat_column: i64,
    /// Free for this showing (no pending or confirmed booking holds it).
    pub is_available: bool,
    /// Catalog maintenance flag.
    pub in_service: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSeats {
    pub schedule_id: Uuid,
    pub hall_id: Uuid,
    pub seats: Vec<SeatAvailability>,
}

/// Seat ids held by active bookings for the schedule.
pub fn booked_seats(conn: &Connection, schedule_id: &Uuid) -> AppResult<HashSet<Uuid>> {
    Ok(queries::get_booked_seat_ids(conn, schedule_id)?)
}

/// The hall's full roster, ordered by row then column, marked against the
/// schedule's booked seats. Display only; booking re-checks inside its
/// own transaction.
pub fn availability(
    conn: &Connection,
    hall_id: &Uuid,
    schedule_id: &Uuid,
) -> AppResult<Vec<SeatAvailability>> {
    let hall = catalog::get_hall(conn, hall_id)?
        .ok_or_else(|| AppError::NotFound(format!("hall {hall_id} not found")))?;
    let schedule = catalog::get_schedule(conn, schedule_id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id} not found")))?;

    if schedule.hall_id != hall.id {
        return Err(AppError::InvalidState(format!(
            "schedule {schedule_id} does not run in hall {hall_id}"
        )));
    }

    let booked = booked_seats(conn, schedule_id)?;
    let seats = catalog::get_seats_by_hall(conn, &hall.id)?;

    Ok(seats
        .into_iter()
        .map(|seat| SeatAvailability {
            is_available: !booked.contains(&seat.id),
            in_service: seat.is_available,
            seat_id: seat.id,
            seat_number: seat.seat_number,
            seat_row: seat.seat_row,
            seat_column: seat.seat_column,
        })
        .collect())
}

/// Availability for the hall a schedule runs in.
pub fn schedule_seats(conn: &Connection, schedule_id: &Uuid) -> AppResult<ScheduleSeats> {
    let schedule = catalog::get_schedule(conn, schedule_id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id} not found")))?;

    let seats = availability(conn, &schedule.hall_id, schedule_id)?;

    Ok(ScheduleSeats {
        schedule_id: schedule.id,
        hall_id: schedule.hall_id,
        seats,
    })
}
