use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::BookingPolicy;
use crate::db::{catalog, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{BookingDetail, BookingStatus, BookingView, ScheduleDetails};
use crate::services::booking::booking_view;
use crate::services::in_immediate_tx;

/// Cancels a pending or confirmed booking. Its seats become bookable again as
/// soon as this commits.
pub fn cancel_booking(
    conn: &mut Connection,
    booking_id: &Uuid,
    now: NaiveDateTime,
) -> AppResult<BookingView> {
    let view = in_immediate_tx(conn, "cancel", |tx| {
        let booking = queries::get_booking_by_id(tx, booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(AppError::InvalidState(format!(
                "booking status is {}, cannot cancel",
                booking.status
            )));
        }

        let cancelled = queries::update_booking_status_if(
            tx,
            booking_id,
            booking.status,
            BookingStatus::Cancelled,
            now,
        )?;
        if !cancelled {
            tracing::warn!(%booking_id, from = %booking.status, "booking changed state during cancel");
            return Err(AppError::InvalidState(
                "booking changed state, retry the cancel".into(),
            ));
        }

        let mut booking = booking;
        booking.status = BookingStatus::Cancelled;
        booking_view(tx, booking)
    })?;

    tracing::info!(booking_id = %view.id, order_id = %view.order_id, "booking cancelled");
    Ok(view)
}

pub fn get_booking_detail(conn: &Connection, booking_id: &Uuid) -> AppResult<BookingDetail> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
    let schedule = catalog::get_schedule(conn, &booking.schedule_id)?.ok_or_else(|| {
        AppError::NotFound(format!("schedule {} not found", booking.schedule_id))
    })?;

    let view = booking_view(conn, booking)?;
    let schedule_details = ScheduleDetails {
        show: view.show.clone(),
        price: schedule.price,
    };

    Ok(BookingDetail {
        booking: view,
        schedule_details,
    })
}

/// Expires bookings left `pending` for longer than the policy TTL and returns
/// how many were expired. Their seats are released by the store.
pub fn expire_stale_pending(
    conn: &Connection,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> AppResult<usize> {
    let Some(cutoff) = now.checked_sub_signed(policy.pending_ttl) else {
        return Ok(0);
    };
    let expired = queries::expire_pending_before(conn, cutoff, now)?;

    if expired > 0 {
        tracing::info!(expired, %cutoff, "expired stale pending bookings");
    }
    Ok(expired)
}
