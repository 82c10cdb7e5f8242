//! Read access to the catalog owned by other parts of the system (schedules,
//! halls, seats, payment methods, sessions). The `insert_*` functions exist for
//! seeding and tests; the booking core never writes these tables.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{get_decimal, get_uuid};
use crate::models::{
    Cinema, Hall, Movie, PaymentMethod, Role, Schedule, Seat, ShowInfo, User,
};

// ── Schedules ──

pub fn get_schedule(conn: &Connection, id: &Uuid) -> anyhow::Result<Option<Schedule>> {
    let schedule = conn
        .query_row(
            "SELECT id, movie_id, hall_id, show_date, show_time, price FROM schedules WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(Schedule {
                    id: get_uuid(row, 0)?,
                    movie_id: get_uuid(row, 1)?,
                    hall_id: get_uuid(row, 2)?,
                    show_date: row.get(3)?,
                    show_time: row.get(4)?,
                    price: get_decimal(row, 5)?,
                })
            },
        )
        .optional()?;
    Ok(schedule)
}

/// Movie, cinema and hall display fields for a schedule in one lookup.
pub fn get_show_info(conn: &Connection, schedule_id: &Uuid) -> anyhow::Result<Option<ShowInfo>> {
    let info = conn
        .query_row(
            "SELECT m.title, c.name, h.hall_number, s.show_date, s.show_time
             FROM schedules s
             INNER JOIN movies m ON m.id = s.movie_id
             INNER JOIN halls h ON h.id = s.hall_id
             INNER JOIN cinemas c ON c.id = h.cinema_id
             WHERE s.id = ?1",
            params![schedule_id.to_string()],
            |row| {
                Ok(ShowInfo {
                    movie_title: row.get(0)?,
                    cinema_name: row.get(1)?,
                    hall_number: row.get(2)?,
                    show_date: row.get(3)?,
                    show_time: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(info)
}

// ── Halls & Seats ──

pub fn get_hall(conn: &Connection, id: &Uuid) -> anyhow::Result<Option<Hall>> {
    let hall = conn
        .query_row(
            "SELECT id, cinema_id, hall_number, total_seats FROM halls WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(Hall {
                    id: get_uuid(row, 0)?,
                    cinema_id: get_uuid(row, 1)?,
                    hall_number: row.get(2)?,
                    total_seats: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(hall)
}

pub fn get_seat(conn: &Connection, id: &Uuid) -> anyhow::Result<Option<Seat>> {
    let seat = conn
        .query_row(
            "SELECT id, hall_id, seat_number, seat_row, seat_column, is_available
             FROM seats WHERE id = ?1",
            params![id.to_string()],
            parse_seat_row,
        )
        .optional()?;
    Ok(seat)
}

pub fn get_seats_by_hall(conn: &Connection, hall_id: &Uuid) -> anyhow::Result<Vec<Seat>> {
    let mut stmt = conn.prepare(
        "SELECT id, hall_id, seat_number, seat_row, seat_column, is_available
         FROM seats WHERE hall_id = ?1 ORDER BY seat_row ASC, seat_column ASC",
    )?;

    let rows = stmt.query_map(params![hall_id.to_string()], parse_seat_row)?;

    let mut seats = vec![];
    for row in rows {
        seats.push(row?);
    }
    Ok(seats)
}

fn parse_seat_row(row: &Row) -> rusqlite::Result<Seat> {
    Ok(Seat {
        id: get_uuid(row, 0)?,
        hall_id: get_uuid(row, 1)?,
        seat_number: row.get(2)?,
        seat_row: row.get(3)?,
        seat_column: row.get(4)?,
        is_available: row.get::<_, i64>(5)? != 0,
    })
}

// ── Payment Methods ──

pub fn get_payment_method(conn: &Connection, id: &Uuid) -> anyhow::Result<Option<PaymentMethod>> {
    let method = conn
        .query_row(
            "SELECT id, name, is_active FROM payment_methods WHERE id = ?1",
            params![id.to_string()],
            parse_payment_method_row,
        )
        .optional()?;
    Ok(method)
}

pub fn get_active_payment_methods(conn: &Connection) -> anyhow::Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, is_active FROM payment_methods WHERE is_active = 1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], parse_payment_method_row)?;

    let mut methods = vec![];
    for row in rows {
        methods.push(row?);
    }
    Ok(methods)
}

fn parse_payment_method_row(row: &Row) -> rusqlite::Result<PaymentMethod> {
    Ok(PaymentMethod {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        is_active: row.get::<_, i64>(2)? != 0,
    })
}

// ── Sessions ──

/// Resolves a bearer token to its active user, ignoring revoked or expired sessions.
pub fn find_session_user(
    conn: &Connection,
    token: &str,
    now: NaiveDateTime,
) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.username, u.email, u.role, u.is_active
             FROM sessions s
             INNER JOIN users u ON u.id = s.user_id
             WHERE s.token = ?1 AND s.revoked_at IS NULL AND s.expires_at > ?2 AND u.is_active = 1",
            params![token, now],
            |row| {
                let role: String = row.get(3)?;
                Ok(User {
                    id: get_uuid(row, 0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    role: Role::parse(&role),
                    is_active: row.get::<_, i64>(4)? != 0,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ── Seeding ──

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, role, is_active) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.username,
            user.email,
            user.role.as_str(),
            user.is_active as i64,
        ],
    )?;
    Ok(())
}

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: &Uuid,
    expires_at: NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id.to_string(), expires_at],
    )?;
    Ok(())
}

pub fn insert_cinema(conn: &Connection, cinema: &Cinema) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO cinemas (id, name, location, city) VALUES (?1, ?2, ?3, ?4)",
        params![cinema.id.to_string(), cinema.name, cinema.location, cinema.city],
    )?;
    Ok(())
}

pub fn insert_hall(conn: &Connection, hall: &Hall) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO halls (id, cinema_id, hall_number, total_seats) VALUES (?1, ?2, ?3, ?4)",
        params![
            hall.id.to_string(),
            hall.cinema_id.to_string(),
            hall.hall_number,
            hall.total_seats,
        ],
    )?;
    Ok(())
}

pub fn insert_seat(conn: &Connection, seat: &Seat) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO seats (id, hall_id, seat_number, seat_row, seat_column, is_available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            seat.id.to_string(),
            seat.hall_id.to_string(),
            seat.seat_number,
            seat.seat_row,
            seat.seat_column,
            seat.is_available as i64,
        ],
    )?;
    Ok(())
}

pub fn insert_movie(conn: &Connection, movie: &Movie) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO movies (id, title, duration_in_minutes) VALUES (?1, ?2, ?3)",
        params![movie.id.to_string(), movie.title, movie.duration_in_minutes],
    )?;
    Ok(())
}

pub fn insert_schedule(conn: &Connection, schedule: &Schedule) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO schedules (id, movie_id, hall_id, show_date, show_time, price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            schedule.id.to_string(),
            schedule.movie_id.to_string(),
            schedule.hall_id.to_string(),
            schedule.show_date,
            schedule.show_time,
            schedule.price.to_string(),
        ],
    )?;
    Ok(())
}

pub fn insert_payment_method(conn: &Connection, method: &PaymentMethod) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payment_methods (id, name, is_active) VALUES (?1, ?2, ?3)",
        params![method.id.to_string(), method.name, method.is_active as i64],
    )?;
    Ok(())
}
