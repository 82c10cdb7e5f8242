use std::collections::HashSet;

use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::BookingPolicy;
use crate::db::{self, catalog, queries};
use crate::errors::{AppError, AppResult};
use crate::models::booking::generate_order_id;
use crate::models::{
    Booking, BookingSeat, BookingStatus, BookingView, PageRequest, Paginated, PaymentView, Seat,
};
use crate::services::{availability, in_immediate_tx, parse_id};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub schedule_id: String,
    pub seat_ids: Vec<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

/// Reserves seats for a showing. The schedule, seat and conflict checks and
/// the inserts share one IMMEDIATE transaction, so two callers racing for a
/// seat are serialised and the loser sees `Conflict`.
pub fn create_booking(
    conn: &mut Connection,
    policy: &BookingPolicy,
    user_id: &Uuid,
    request: &CreateBookingRequest,
) -> AppResult<BookingView> {
    if request.seat_ids.is_empty() {
        return Err(AppError::Validation("at least one seat is required".into()));
    }

    let schedule_id = parse_id("schedule", &request.schedule_id)?;
    let payment_method_id = request
        .payment_method_id
        .as_deref()
        .map(|id| parse_id("payment method", id))
        .transpose()?;

    let mut seat_ids = Vec::with_capacity(request.seat_ids.len());
    let mut seen = HashSet::new();
    for raw in &request.seat_ids {
        let seat_id = parse_id("seat", raw)?;
        if !seen.insert(seat_id) {
            return Err(AppError::Validation(format!(
                "seat {seat_id} is requested more than once"
            )));
        }
        seat_ids.push(seat_id);
    }

    let view = in_immediate_tx(conn, "booking", |tx| {
        reserve_seats(
            tx,
            policy,
            user_id,
            &schedule_id,
            &seat_ids,
            payment_method_id.as_ref(),
        )
    })?;

    tracing::info!(
        booking_id = %view.id,
        order_id = %view.order_id,
        user_id = %user_id,
        schedule_id = %schedule_id,
        seats = view.total_seats,
        total_price = %view.total_price,
        "booking created"
    );
    Ok(view)
}

fn reserve_seats(
    conn: &Connection,
    policy: &BookingPolicy,
    user_id: &Uuid,
    schedule_id: &Uuid,
    seat_ids: &[Uuid],
    payment_method_id: Option<&Uuid>,
) -> AppResult<BookingView> {
    let schedule = catalog::get_schedule(conn, schedule_id)?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id} not found")))?;

    let now = Utc::now();
    let earliest = now.naive_utc().checked_sub_signed(policy.grace_window);
    if earliest.is_some_and(|earliest| schedule.starts_at() < earliest) {
        return Err(AppError::InvalidState(
            "cannot book for a past schedule".into(),
        ));
    }

    if let Some(method_id) = payment_method_id {
        let method = catalog::get_payment_method(conn, method_id)?
            .ok_or_else(|| AppError::NotFound(format!("payment method {method_id} not found")))?;
        if !method.is_active {
            return Err(AppError::InvalidState(format!(
                "payment method {} is not active",
                method.name
            )));
        }
    }

    let mut seats: Vec<Seat> = Vec::with_capacity(seat_ids.len());
    for seat_id in seat_ids {
        let seat = catalog::get_seat(conn, seat_id)?
            .ok_or_else(|| AppError::NotFound(format!("seat {seat_id} not found")))?;
        if seat.hall_id != schedule.hall_id {
            return Err(AppError::InvalidState(format!(
                "seat {} is not in the schedule's hall",
                seat.seat_number
            )));
        }
        seats.push(seat);
    }

    let booked = availability::booked_seats(conn, schedule_id)?;
    if let Some(taken) = seats.iter().find(|s| booked.contains(&s.id)) {
        return Err(AppError::Conflict(format!(
            "seat {} is already booked",
            taken.seat_number
        )));
    }

    let created_at = now.naive_utc();
    let mut booking = Booking {
        id: Uuid::new_v4(),
        order_id: String::new(),
        user_id: *user_id,
        schedule_id: *schedule_id,
        total_seats: seats.len() as i64,
        total_price: schedule.price * Decimal::from(seats.len()),
        status: BookingStatus::Pending,
        created_at,
        updated_at: created_at,
    };
    insert_with_order_id(conn, policy.order_code_attempts, &mut booking, || {
        generate_order_id(Utc::now())
    })?;

    for seat in &seats {
        let booking_seat = BookingSeat {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            schedule_id: booking.schedule_id,
            seat_id: seat.id,
            created_at,
        };
        if let Err(e) = queries::insert_booking_seat(conn, &booking_seat) {
            if unique_violation(&e, "booking_seats.schedule_id") {
                return Err(AppError::Conflict(format!(
                    "seat {} is already booked",
                    seat.seat_number
                )));
            }
            return Err(e.into());
        }
    }

    booking_view(conn, booking)
}

/// Inserts `booking`, drawing a fresh order code for each attempt. Only a
/// collision on the order code is retried.
fn insert_with_order_id(
    conn: &Connection,
    attempts: u32,
    booking: &mut Booking,
    mut next_order_id: impl FnMut() -> String,
) -> AppResult<()> {
    for attempt in 1..=attempts {
        booking.order_id = next_order_id();
        match queries::insert_booking(conn, booking) {
            Ok(()) => return Ok(()),
            Err(e) if unique_violation(&e, "bookings.order_id") => {
                tracing::warn!(attempt, order_id = %booking.order_id, "order code collision");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Conflict(
        "could not allocate a unique order code, try again".into(),
    ))
}

fn unique_violation(err: &anyhow::Error, target: &str) -> bool {
    err.downcast_ref::<rusqlite::Error>()
        .is_some_and(|e| db::is_unique_violation(e, target))
}

/// A booking enriched with show details, seat numbers and its latest payment.
pub fn booking_view(conn: &Connection, booking: Booking) -> AppResult<BookingView> {
    let show = catalog::get_show_info(conn, &booking.schedule_id)?.ok_or_else(|| {
        AppError::NotFound(format!("schedule {} not found", booking.schedule_id))
    })?;
    let seat_numbers = queries::get_seat_numbers_for_booking(conn, &booking.id)?;
    let payment = queries::get_latest_payment_for_booking(conn, &booking.id)?
        .map(|(payment, method)| PaymentView::new(payment, method));

    Ok(BookingView {
        id: booking.id,
        order_id: booking.order_id,
        user_id: booking.user_id,
        schedule_id: booking.schedule_id,
        show,
        total_seats: booking.total_seats,
        total_price: booking.total_price,
        status: booking.status,
        seat_numbers,
        payment,
        created_at: booking.created_at,
    })
}

/// The caller's bookings, newest first.
pub fn list_user_bookings(
    conn: &Connection,
    user_id: &Uuid,
    page: &PageRequest,
) -> AppResult<Paginated<BookingView>> {
    let total = queries::count_bookings_for_user(conn, user_id)?;
    let bookings = queries::get_bookings_for_user(conn, user_id, page.limit(), page.offset())?;

    let views = bookings
        .into_iter()
        .map(|b| booking_view(conn, b))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Paginated::new(views, page, total))
}
