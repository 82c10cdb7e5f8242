use std::collections::HashSet;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{get_decimal, get_uuid};
use crate::models::{
    Booking, BookingSeat, BookingStatus, Payment, PaymentMethod, PaymentStatus,
};

const BOOKING_COLUMNS: &str =
    "id, order_id, user_id, schedule_id, total_seats, total_price, status, created_at, updated_at";

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, order_id, user_id, schedule_id, total_seats, total_price, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id.to_string(),
            booking.order_id,
            booking.user_id.to_string(),
            booking.schedule_id.to_string(),
            booking.total_seats,
            booking.total_price.to_string(),
            booking.status.as_str(),
            booking.created_at,
            booking.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &Uuid) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id.to_string()],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_bookings_for_user(
    conn: &Connection,
    user_id: &Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt.query_map(
        params![user_id.to_string(), limit, offset],
        parse_booking_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn count_bookings_for_user(conn: &Connection, user_id: &Uuid) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Moves a booking from `expected` to `next`. Returns false when the row no
/// longer has the expected status, so a concurrent writer got there first.
pub fn update_booking_status_if(
    conn: &Connection,
    id: &Uuid,
    expected: BookingStatus,
    next: BookingStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![next.as_str(), now, id.to_string(), expected.as_str()],
    )?;
    Ok(count > 0)
}

/// Expires pending bookings created before `cutoff`; returns how many.
pub fn expire_pending_before(
    conn: &Connection,
    cutoff: NaiveDateTime,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'expired', updated_at = ?1
         WHERE status = 'pending' AND created_at < ?2",
        params![now, cutoff],
    )?;
    Ok(count)
}

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(6)?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    Ok(Booking {
        id: get_uuid(row, 0)?,
        order_id: row.get(1)?,
        user_id: get_uuid(row, 2)?,
        schedule_id: get_uuid(row, 3)?,
        total_seats: row.get(4)?,
        total_price: get_decimal(row, 5)?,
        status,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ── Booking Seats ──

pub fn insert_booking_seat(conn: &Connection, seat: &BookingSeat) -> anyhow::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO booking_seats (id, booking_id, schedule_id, seat_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    stmt.execute(params![
        seat.id.to_string(),
        seat.booking_id.to_string(),
        seat.schedule_id.to_string(),
        seat.seat_id.to_string(),
        seat.created_at,
    ])?;
    Ok(())
}

/// Seats held by pending or confirmed bookings for a schedule.
pub fn get_booked_seat_ids(conn: &Connection, schedule_id: &Uuid) -> anyhow::Result<HashSet<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT bs.seat_id
         FROM booking_seats bs
         INNER JOIN bookings b ON bs.booking_id = b.id
         WHERE b.schedule_id = ?1 AND b.status IN ('pending', 'confirmed')",
    )?;

    let rows = stmt.query_map(params![schedule_id.to_string()], |row| get_uuid(row, 0))?;

    let mut seat_ids = HashSet::new();
    for row in rows {
        seat_ids.insert(row?);
    }
    Ok(seat_ids)
}

pub fn get_seat_numbers_for_booking(
    conn: &Connection,
    booking_id: &Uuid,
) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT s.seat_number
         FROM booking_seats bs
         INNER JOIN seats s ON s.id = bs.seat_id
         WHERE bs.booking_id = ?1
         ORDER BY s.seat_row ASC, s.seat_column ASC",
    )?;

    let rows = stmt.query_map(params![booking_id.to_string()], |row| row.get(0))?;

    let mut numbers = vec![];
    for row in rows {
        numbers.push(row?);
    }
    Ok(numbers)
}

// ── Payments ──

pub fn insert_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payments (id, booking_id, payment_method_id, amount, status, transaction_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            payment.id.to_string(),
            payment.booking_id.to_string(),
            payment.payment_method_id.to_string(),
            payment.amount.to_string(),
            payment.status.as_str(),
            payment.transaction_id,
            payment.created_at,
            payment.updated_at,
        ],
    )?;
    Ok(())
}

/// The most recent payment for a booking together with its method.
pub fn get_latest_payment_for_booking(
    conn: &Connection,
    booking_id: &Uuid,
) -> anyhow::Result<Option<(Payment, PaymentMethod)>> {
    let result = conn
        .query_row(
            "SELECT p.id, p.booking_id, p.payment_method_id, p.amount, p.status, p.transaction_id,
                    p.created_at, p.updated_at, pm.name, pm.is_active
             FROM payments p
             INNER JOIN payment_methods pm ON pm.id = p.payment_method_id
             WHERE p.booking_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT 1",
            params![booking_id.to_string()],
            |row| {
                let status_str: String = row.get(4)?;
                let status = PaymentStatus::parse(&status_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        format!("unknown payment status: {status_str}").into(),
                    )
                })?;

                let payment = Payment {
                    id: get_uuid(row, 0)?,
                    booking_id: get_uuid(row, 1)?,
                    payment_method_id: get_uuid(row, 2)?,
                    amount: get_decimal(row, 3)?,
                    status,
                    transaction_id: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                };
                let method = PaymentMethod {
                    id: payment.payment_method_id,
                    name: row.get(8)?,
                    is_active: row.get::<_, i64>(9)? != 0,
                };
                Ok((payment, method))
            },
        )
        .optional()?;
    Ok(result)
}
