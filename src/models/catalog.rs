use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cinema {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hall {
    pub id: Uuid,
    pub cinema_id: Uuid,
    pub hall_number: i64,
    pub total_seats: i64,
}

/// A physical seat. `is_available` is the catalog's maintenance flag, not
/// whether the seat is free for a given showtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub hall_id: Uuid,
    pub seat_number: String,
    pub seat_row: String,
    pub seat_column: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub duration_in_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub hall_id: Uuid,
    pub show_date: NaiveDate,
    pub show_time: NaiveTime,
    pub price: Decimal,
}

impl Schedule {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.show_date.and_time(self.show_time)
    }
}
