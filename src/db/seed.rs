//! Demo catalog: one cinema, two halls, a movie, a schedule and three users
//! with live sessions. Used by `SEED_DEMO_DATA=true` and by the test suites.

use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::catalog;
use crate::models::{Cinema, Hall, Movie, PaymentMethod, Role, Schedule, Seat, User};

/// Matches the "Credit Card" row seeded by migration.
pub const CREDIT_CARD_ID: &str = "6f1c2d8e-4b3a-4f6e-9c1d-2a7b8e9f0a11";

const ROWS: [&str; 2] = ["A", "B"];
const COLUMNS: i64 = 5;
const SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub customer: SeededUser,
    pub other_customer: SeededUser,
    pub admin: SeededUser,
    pub cinema: Cinema,
    pub hall: Hall,
    pub other_hall: Hall,
    /// Seats A1..A5, B1..B5 of `hall`.
    pub seats: Vec<Seat>,
    /// Seat A1 of `other_hall`.
    pub foreign_seat: Seat,
    pub movie: Movie,
    /// Tomorrow at 19:30 in `hall`, priced 50000.
    pub schedule: Schedule,
    pub payment_method: PaymentMethod,
    pub inactive_payment_method: PaymentMethod,
}

impl DemoCatalog {
    pub fn seat(&self, number: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == number)
    }

    pub fn seat_ids(&self, numbers: &[&str]) -> Vec<Uuid> {
        numbers
            .iter()
            .filter_map(|n| self.seat(n).map(|s| s.id))
            .collect()
    }
}

pub fn seed_demo(conn: &Connection) -> anyhow::Result<DemoCatalog> {
    let customer = seed_user(conn, "alice", Role::Customer)?;
    let other_customer = seed_user(conn, "bob", Role::Customer)?;
    let admin = seed_user(conn, "admin", Role::Admin)?;

    let cinema = Cinema {
        id: Uuid::new_v4(),
        name: "Grand Cinema".to_string(),
        location: "Jl. Sudirman 1".to_string(),
        city: "Jakarta".to_string(),
    };
    catalog::insert_cinema(conn, &cinema)?;

    let hall = seed_hall(conn, &cinema, 1)?;
    let other_hall = seed_hall(conn, &cinema, 2)?;

    let mut seats = vec![];
    for row in ROWS {
        for column in 1..=COLUMNS {
            seats.push(seed_seat(conn, &hall, row, column)?);
        }
    }
    let foreign_seat = seed_seat(conn, &other_hall, "A", 1)?;

    let movie = Movie {
        id: Uuid::new_v4(),
        title: "The Long Night".to_string(),
        duration_in_minutes: 128,
    };
    catalog::insert_movie(conn, &movie)?;

    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
    let starts_at = tomorrow
        .and_hms_opt(19, 30, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid demo show time"))?;
    let schedule = seed_schedule(conn, &movie, &hall, starts_at, Decimal::from(50_000))?;

    let payment_method = catalog::get_payment_method(conn, &Uuid::parse_str(CREDIT_CARD_ID)?)?
        .ok_or_else(|| anyhow::anyhow!("credit card payment method missing"))?;

    let inactive_payment_method = PaymentMethod {
        id: Uuid::new_v4(),
        name: "Gift Voucher".to_string(),
        is_active: false,
    };
    catalog::insert_payment_method(conn, &inactive_payment_method)?;

    Ok(DemoCatalog {
        customer,
        other_customer,
        admin,
        cinema,
        hall,
        other_hall,
        seats,
        foreign_seat,
        movie,
        schedule,
        payment_method,
        inactive_payment_method,
    })
}

/// Adds a showing of `movie` in `hall`.
pub fn seed_schedule(
    conn: &Connection,
    movie: &Movie,
    hall: &Hall,
    starts_at: NaiveDateTime,
    price: Decimal,
) -> anyhow::Result<Schedule> {
    let schedule = Schedule {
        id: Uuid::new_v4(),
        movie_id: movie.id,
        hall_id: hall.id,
        show_date: starts_at.date(),
        show_time: starts_at.time(),
        price,
    };
    catalog::insert_schedule(conn, &schedule)?;
    Ok(schedule)
}

fn seed_user(conn: &Connection, username: &str, role: Role) -> anyhow::Result<SeededUser> {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        role,
        is_active: true,
    };
    catalog::insert_user(conn, &user)?;

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now().naive_utc() + Duration::days(SESSION_DAYS);
    catalog::insert_session(conn, &token, &user.id, expires_at)?;

    Ok(SeededUser { user, token })
}

fn seed_hall(conn: &Connection, cinema: &Cinema, hall_number: i64) -> anyhow::Result<Hall> {
    let hall = Hall {
        id: Uuid::new_v4(),
        cinema_id: cinema.id,
        hall_number,
        total_seats: ROWS.len() as i64 * COLUMNS,
    };
    catalog::insert_hall(conn, &hall)?;
    Ok(hall)
}

fn seed_seat(conn: &Connection, hall: &Hall, row: &str, column: i64) -> anyhow::Result<Seat> {
    let seat = Seat {
        id: Uuid::new_v4(),
        hall_id: hall.id,
        seat_number: format!("{row}{column}"),
        seat_row: row.to_string(),
        seat_column: column,
        is_available: true,
    };
    catalog::insert_seat(conn, &seat)?;
    Ok(seat)
}
